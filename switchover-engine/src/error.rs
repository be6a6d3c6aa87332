//! Error types for switchover-engine.

use std::path::PathBuf;

use thiserror::Error;

use switchover_core::{PoolName, ServiceName};

/// Everything that aborts a switch.
///
/// Precondition failures surface before any plan is built; `ExportFailed`
/// and `RollbackFailed` abort a plan midway.
#[derive(Debug, Error)]
pub enum SwitchError {
    /// A service directory could not be listed.
    #[error("cannot read service directory {path}: {source}")]
    ServiceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A service's `run` entry point could not be resolved.
    #[error("cannot resolve entry point of service '{service}' at {path}: {source}")]
    ServiceTarget {
        service: ServiceName,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The pool status check could not be started.
    #[error("failed to run {program}: {source}")]
    ProbeSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The pool status check exited unsuccessfully.
    #[error("{program} check failed ({status}): {stderr}")]
    ProbeFailed {
        program: PathBuf,
        status: String,
        stderr: String,
    },

    /// A line of `osup check` output did not parse.
    #[error("{program} check, line {line_no}: malformed pool status '{line}'")]
    MalformedProbeLine {
        program: PathBuf,
        line_no: usize,
        line: String,
    },

    #[error("export of pool {pool} failed, cannot proceed: {reason}")]
    ExportFailed { pool: PoolName, reason: String },

    #[error("rollback of pool {pool} to {version} failed, cannot proceed: {reason}")]
    RollbackFailed {
        pool: PoolName,
        version: String,
        reason: String,
    },
}
