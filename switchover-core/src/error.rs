//! Error types for switchover-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from resolving the host layout.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The override file exists but could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error in the override file, with its path.
    #[error("failed to parse switch configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The executable is not installed as `<system>/bin/<name>`.
    #[error("cannot locate the configuration tree from executable {exe}")]
    NoSystemRoot { exe: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
