//! The ordered list of actions a switch performs.
//!
//! Pools go first so storage is in a state the new services can use before
//! any of them run:
//!
//! 1. Export    — pools to roll back or upgrade
//! 2. Rollback  — pools whose format is newer than the new toolchain
//! 3. Stop      — services gone from the new configuration
//! 4. Activate  — the new configuration's activation hook
//! 5. Reload    — changed services in the reload table
//! 6. Restart   — other changed services
//! 7. Start     — services new in this configuration
//!
//! The plan is built once and is the same for a real and a dry run.

use std::fmt;

use switchover_core::{Layout, PoolName, ReloadSignals, ServiceName};

use crate::pools::PoolResolution;
use crate::runner::Invocation;
use crate::services::ServiceDiff;

/// Whether side effects are carried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Live,
    DryRun,
}

impl RunMode {
    pub fn is_dry_run(self) -> bool {
        matches!(self, RunMode::DryRun)
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Export,
    Rollback,
    Stop,
    Activate,
    Reload,
    Restart,
    Start,
}

impl Phase {
    /// All phases in execution order.
    pub fn all() -> &'static [Phase] {
        &[
            Phase::Export,
            Phase::Rollback,
            Phase::Stop,
            Phase::Activate,
            Phase::Reload,
            Phase::Restart,
            Phase::Start,
        ]
    }

    /// Header printed before the phase runs.
    pub fn announcement(self, mode: RunMode) -> &'static str {
        match (self, mode) {
            (Phase::Export, RunMode::Live) => "exporting pools...",
            (Phase::Export, RunMode::DryRun) => "would export pools...",
            (Phase::Rollback, RunMode::Live) => "rolling back pools...",
            (Phase::Rollback, RunMode::DryRun) => "would roll back pools...",
            (Phase::Stop, RunMode::Live) => "stopping deprecated services...",
            (Phase::Stop, RunMode::DryRun) => "would stop deprecated services...",
            (Phase::Activate, RunMode::Live) => "activating the configuration...",
            (Phase::Activate, RunMode::DryRun) => "would activate the configuration...",
            (Phase::Reload, RunMode::Live) => "reloading changed services...",
            (Phase::Reload, RunMode::DryRun) => "would reload changed services...",
            (Phase::Restart, RunMode::Live) => "restarting changed services...",
            (Phase::Restart, RunMode::DryRun) => "would restart changed services...",
            (Phase::Start, RunMode::Live) => "starting new services...",
            (Phase::Start, RunMode::DryRun) => "would start new services...",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Export => "export",
            Phase::Rollback => "rollback",
            Phase::Stop => "stop",
            Phase::Activate => "activate",
            Phase::Reload => "reload",
            Phase::Restart => "restart",
            Phase::Start => "start",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// A single external action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    ExportPool { pool: PoolName },
    RollbackPool { pool: PoolName, version: String },
    StopService { name: ServiceName },
    Activate,
    ReloadService { name: ServiceName, signal: String },
    RestartService { name: ServiceName },
    StartService { name: ServiceName },
}

impl Step {
    pub fn phase(&self) -> Phase {
        match self {
            Step::ExportPool { .. } => Phase::Export,
            Step::RollbackPool { .. } => Phase::Rollback,
            Step::StopService { .. } => Phase::Stop,
            Step::Activate => Phase::Activate,
            Step::ReloadService { .. } => Phase::Reload,
            Step::RestartService { .. } => Phase::Restart,
            Step::StartService { .. } => Phase::Start,
        }
    }

    /// The command this step runs under `layout`.
    pub fn invocation(&self, layout: &Layout) -> Invocation {
        match self {
            Step::ExportPool { pool } => Invocation::new(layout.osctl())
                .arg("pool")
                .arg("export")
                .arg("-f")
                .arg(&pool.0),
            Step::RollbackPool { pool, version } => {
                Invocation::new(Layout::osup(&layout.current_bin))
                    .arg("rollback")
                    .arg(&pool.0)
                    .arg(version)
            }
            Step::StopService { name } => sv(layout, "stop", name),
            Step::Activate => Invocation::new(&layout.activate),
            Step::ReloadService { name, signal } => sv(layout, signal, name),
            Step::RestartService { name } => sv(layout, "restart", name),
            Step::StartService { name } => sv(layout, "start", name),
        }
    }
}

fn sv(layout: &Layout, command: &str, name: &ServiceName) -> Invocation {
    Invocation::new(layout.sv()).arg(command).arg(&name.0)
}

/// Operator-facing line, the same in both run modes.
impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::ExportPool { pool } => write!(f, "> exporting pool {pool}"),
            Step::RollbackPool { pool, version } => {
                write!(f, "> rolling back pool {pool} to {version}")
            }
            Step::StopService { name } => write!(f, "> sv stop {name}"),
            Step::Activate => write!(f, "> activate"),
            Step::ReloadService { name, signal } => write!(f, "> sv {signal} {name}"),
            Step::RestartService { name } => write!(f, "> sv restart {name}"),
            Step::StartService { name } => write!(f, "> sv start {name}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanPhase {
    pub phase: Phase,
    pub steps: Vec<Step>,
}

/// Every phase, in order, with the steps it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub phases: Vec<PlanPhase>,
    /// Pools left alone because no safe action exists.
    pub unresolved: Vec<PoolName>,
}

impl ExecutionPlan {
    pub fn build(services: &ServiceDiff, pools: &PoolResolution, reload: &ReloadSignals) -> Self {
        let phases = Phase::all()
            .iter()
            .map(|&phase| {
                let steps: Vec<Step> = match phase {
                    Phase::Export => pools
                        .to_export()
                        .map(|p| Step::ExportPool {
                            pool: p.name.clone(),
                        })
                        .collect(),
                    Phase::Rollback => pools
                        .to_rollback
                        .iter()
                        .map(|p| Step::RollbackPool {
                            pool: p.name.clone(),
                            version: p.rollback_version.clone(),
                        })
                        .collect(),
                    Phase::Stop => services
                        .to_stop
                        .iter()
                        .map(|name| Step::StopService { name: name.clone() })
                        .collect(),
                    Phase::Activate => vec![Step::Activate],
                    Phase::Reload => services
                        .to_reload
                        .iter()
                        .map(|name| Step::ReloadService {
                            name: name.clone(),
                            signal: reload.signal_for(name).to_string(),
                        })
                        .collect(),
                    Phase::Restart => services
                        .to_restart
                        .iter()
                        .map(|name| Step::RestartService { name: name.clone() })
                        .collect(),
                    Phase::Start => services
                        .to_start
                        .iter()
                        .map(|name| Step::StartService { name: name.clone() })
                        .collect(),
                };
                PlanPhase { phase, steps }
            })
            .collect();

        Self {
            phases,
            unresolved: pools.error_names(),
        }
    }

    /// All steps in execution order.
    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.phases.iter().flat_map(|p| p.steps.iter())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
