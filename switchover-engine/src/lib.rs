//! # switchover-engine
//!
//! Reconciles a running host with a newly built configuration: diffs the
//! supervised services, resolves storage pool versions across the old and
//! new toolchains, and runs the resulting plan (or previews it).
//!
//! Call [`pipeline::run`] for the whole switch, or use the pieces directly.

pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod plan;
pub mod pools;
pub mod report;
pub mod runner;
pub mod services;

pub use error::SwitchError;
pub use plan::{ExecutionPlan, Phase, RunMode, Step};
pub use pools::{PoolResolution, ProbeOutcome};
pub use report::{ActionFailure, Event, ProbeSubject, Reporter, SwitchReport};
pub use runner::{CommandRunner, Invocation, SystemRunner};
pub use services::ServiceDiff;
