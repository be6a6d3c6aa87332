//! Progress events and the switch outcome.

use switchover_core::PoolName;

use crate::plan::{Phase, RunMode, Step};

/// What is being probed before the plan is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeSubject {
    Services,
    Pools,
}

impl ProbeSubject {
    pub fn announcement(self) -> &'static str {
        match self {
            ProbeSubject::Services => "probing runit services...",
            ProbeSubject::Pools => "probing pools...",
        }
    }
}

/// Progress of a switch, emitted in order. Steps are announced before they
/// run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Probing(ProbeSubject),
    UnresolvedPools(Vec<PoolName>),
    PhaseStarted { phase: Phase, mode: RunMode },
    Step(Step),
    ActionFailed(ActionFailure),
}

/// Receives progress events.
pub trait Reporter {
    fn report(&mut self, event: &Event);
}

/// A non-fatal step that did not succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    pub step: Step,
    pub reason: String,
}

/// Outcome of a switch that ran to the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchReport {
    pub mode: RunMode,
    /// Steps attempted, or in a dry run, the ones that would have been.
    /// Activation is never listed for a dry run.
    pub executed: Vec<Step>,
    pub failures: Vec<ActionFailure>,
    pub unresolved: Vec<PoolName>,
}

impl SwitchReport {
    pub fn new(mode: RunMode) -> Self {
        Self {
            mode,
            executed: Vec::new(),
            failures: Vec::new(),
            unresolved: Vec::new(),
        }
    }

    /// `true` when every step succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
