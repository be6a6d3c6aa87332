//! Executes an [`ExecutionPlan`].
//!
//! This is the only place with side effects. Phases run strictly in order,
//! every step is announced before it runs, and a failing export or rollback
//! stops everything: services must not come up on pools in an unknown state.
//! Any other failing step is reported and the plan carries on.

use switchover_core::Layout;

use crate::plan::{ExecutionPlan, RunMode, Step};
use crate::report::{ActionFailure, Event, Reporter, SwitchReport};
use crate::runner::CommandRunner;
use crate::SwitchError;

pub struct Orchestrator<'a> {
    layout: &'a Layout,
    mode: RunMode,
    runner: &'a mut dyn CommandRunner,
    reporter: &'a mut dyn Reporter,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        layout: &'a Layout,
        mode: RunMode,
        runner: &'a mut dyn CommandRunner,
        reporter: &'a mut dyn Reporter,
    ) -> Self {
        Self {
            layout,
            mode,
            runner,
            reporter,
        }
    }

    /// Run every phase of `plan`.
    ///
    /// Returns `ExportFailed` / `RollbackFailed` as soon as such a step fails;
    /// later steps are not attempted.
    pub fn execute(&mut self, plan: &ExecutionPlan) -> Result<SwitchReport, SwitchError> {
        let mut report = SwitchReport::new(self.mode);
        report.unresolved = plan.unresolved.clone();

        for planned in &plan.phases {
            self.reporter.report(&Event::PhaseStarted {
                phase: planned.phase,
                mode: self.mode,
            });

            for step in &planned.steps {
                self.reporter.report(&Event::Step(step.clone()));

                if self.mode.is_dry_run() {
                    if *step != Step::Activate {
                        report.executed.push(step.clone());
                    }
                    continue;
                }

                if let Err(reason) = self.perform(step) {
                    if let Some(err) = fatal(step, &reason) {
                        return Err(err);
                    }
                    tracing::debug!("{} failed: {reason}", step.invocation(self.layout));
                    let failure = ActionFailure {
                        step: step.clone(),
                        reason,
                    };
                    self.reporter.report(&Event::ActionFailed(failure.clone()));
                    report.failures.push(failure);
                }
                report.executed.push(step.clone());
            }
        }

        Ok(report)
    }

    /// Run one step; `Err` carries a human-readable reason.
    fn perform(&mut self, step: &Step) -> Result<(), String> {
        let invocation = step.invocation(self.layout);
        match self.runner.status(&invocation) {
            Ok(exit) if exit.success => Ok(()),
            Ok(exit) => Err(exit.to_string()),
            Err(e) => Err(format!("cannot run {}: {e}", invocation.program.display())),
        }
    }
}

/// The abort error for a failed pool step; `None` for any other step.
fn fatal(step: &Step, reason: &str) -> Option<SwitchError> {
    match step {
        Step::ExportPool { pool } => Some(SwitchError::ExportFailed {
            pool: pool.clone(),
            reason: reason.to_string(),
        }),
        Step::RollbackPool { pool, version } => Some(SwitchError::RollbackFailed {
            pool: pool.clone(),
            version: version.clone(),
            reason: reason.to_string(),
        }),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
