//! Switch entry point used by the CLI.

use switchover_core::Layout;

use crate::orchestrator::Orchestrator;
use crate::plan::{ExecutionPlan, RunMode};
use crate::pools::{self, PoolResolution};
use crate::report::{Event, ProbeSubject, Reporter, SwitchReport};
use crate::runner::CommandRunner;
use crate::services::{self, ServiceDiff};
use crate::SwitchError;

/// Everything known about the switch before anything is changed.
#[derive(Debug, Clone)]
pub struct Assessment {
    pub services: ServiceDiff,
    pub pools: PoolResolution,
}

/// Read both service directories and probe both toolchains.
///
/// Probes run in dry-run mode too; they only read state.
pub fn assess(
    layout: &Layout,
    runner: &mut dyn CommandRunner,
    reporter: &mut dyn Reporter,
) -> Result<Assessment, SwitchError> {
    reporter.report(&Event::Probing(ProbeSubject::Services));
    let old_services = services::read_services(&layout.service_dir)?;
    let new_services = services::read_services(&layout.new_service_dir)?;
    let diff = services::diff_services(&old_services, &new_services, &layout.reload_signals);
    tracing::debug!(
        "services: {} to start, {} to stop, {} to restart, {} to reload",
        diff.to_start.len(),
        diff.to_stop.len(),
        diff.to_restart.len(),
        diff.to_reload.len()
    );

    reporter.report(&Event::Probing(ProbeSubject::Pools));
    let old_pools = pools::probe(runner, &layout.current_bin)?.into_pools();
    let new_pools = pools::probe(runner, &layout.new_bin)?.into_pools();
    let resolution = pools::resolve(&old_pools, &new_pools);

    if !resolution.error.is_empty() {
        let names = resolution.error_names();
        tracing::debug!(
            "unresolved pools: {}",
            names.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
        );
        reporter.report(&Event::UnresolvedPools(names));
    }

    Ok(Assessment {
        services: diff,
        pools: resolution,
    })
}

/// Assess, plan and execute a switch.
pub fn run(
    layout: &Layout,
    mode: RunMode,
    runner: &mut dyn CommandRunner,
    reporter: &mut dyn Reporter,
) -> Result<SwitchReport, SwitchError> {
    let assessment = assess(layout, runner, reporter)?;
    let plan = ExecutionPlan::build(
        &assessment.services,
        &assessment.pools,
        &layout.reload_signals,
    );
    Orchestrator::new(layout, mode, runner, reporter).execute(&plan)
}
