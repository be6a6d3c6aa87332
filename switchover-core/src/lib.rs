//! switchover core library — domain types, host layout, errors.
//!
//! - [`types`] — service and pool records, the reload signal table
//! - [`config`] — [`Layout`] and its optional YAML override file
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::Layout;
pub use error::ConfigError;
pub use types::{
    PoolMap, PoolName, PoolRecord, PoolState, ReloadSignals, ServiceName, ServiceRecord,
    ServiceRecordSet, DEFAULT_RELOAD_SIGNAL,
};
