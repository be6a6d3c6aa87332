//! Domain types shared by the switch engine and the CLI.
//!
//! Service and pool names are newtypes; record sets are `BTreeMap`s so every
//! derived list comes out ordered by name.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a supervised service (the subdirectory name in a service dir).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct ServiceName(pub String);

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ServiceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ServiceName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of a storage pool as reported by `osup check`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PoolName(pub String);

impl fmt::Display for PoolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PoolName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PoolName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// A service together with the canonical path of its `run` entry point.
///
/// Equality compares `target` only: a service is unchanged when its entry
/// point resolves to the same realized file, whatever it is called.
#[derive(Debug, Clone, Eq)]
pub struct ServiceRecord {
    pub name: ServiceName,
    pub target: PathBuf,
}

impl PartialEq for ServiceRecord {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}

/// Services of one configuration, keyed by name.
pub type ServiceRecordSet = BTreeMap<ServiceName, ServiceRecord>;

/// Generic reload action passed to `sv` when a service has no entry in
/// [`ReloadSignals`].
pub const DEFAULT_RELOAD_SIGNAL: &str = "reload";

/// Services that are reloaded in place instead of restarted, with the `sv`
/// command used to do so.
///
/// Membership is keyed by name only. `lxcfs` must keep its mounts alive across
/// a switch, so it gets `sv 1` (SIGHUP) instead of a restart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ReloadSignals(BTreeMap<ServiceName, String>);

impl Default for ReloadSignals {
    fn default() -> Self {
        let mut table = BTreeMap::new();
        table.insert(ServiceName::from("lxcfs"), "1".to_string());
        Self(table)
    }
}

impl ReloadSignals {
    /// A table with no reloadable services.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    pub fn contains(&self, name: &ServiceName) -> bool {
        self.0.contains_key(name)
    }

    /// The `sv` command used to reload `name`.
    pub fn signal_for(&self, name: &ServiceName) -> &str {
        self.0
            .get(name)
            .map(String::as_str)
            .unwrap_or(DEFAULT_RELOAD_SIGNAL)
    }

    /// Add or replace the entry for `name`.
    pub fn insert(&mut self, name: ServiceName, signal: impl Into<String>) {
        self.0.insert(name, signal.into());
    }

    /// Override entries of `self` with those of `other`.
    pub fn extend(&mut self, other: ReloadSignals) {
        self.0.extend(other.0);
    }
}

// ---------------------------------------------------------------------------
// Pools
// ---------------------------------------------------------------------------

/// Compatibility of a pool's on-disk format with a given toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolState {
    /// All migrations known to the toolchain are applied.
    Ok,
    /// Valid, but the toolchain has migrations still to apply.
    Outdated,
    /// The pool is newer than the toolchain understands.
    Incompatible,
}

impl fmt::Display for PoolState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolState::Ok => write!(f, "ok"),
            PoolState::Outdated => write!(f, "outdated"),
            PoolState::Incompatible => write!(f, "incompatible"),
        }
    }
}

impl FromStr for PoolState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Self::Ok),
            "outdated" => Ok(Self::Outdated),
            "incompatible" => Ok(Self::Incompatible),
            other => Err(format!(
                "unknown pool state '{other}'; expected: ok, outdated, incompatible"
            )),
        }
    }
}

/// One line of `osup check` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRecord {
    pub name: PoolName,
    pub state: PoolState,
    /// Opaque version token; handed verbatim to `osup rollback`.
    pub rollback_version: String,
}

/// Pools reported by one toolchain, keyed by name.
pub type PoolMap = BTreeMap<PoolName, PoolRecord>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_record_equality_ignores_name() {
        let a = ServiceRecord {
            name: ServiceName::from("web"),
            target: PathBuf::from("/nix/store/aaa-web/run"),
        };
        let b = ServiceRecord {
            name: ServiceName::from("www"),
            target: PathBuf::from("/nix/store/aaa-web/run"),
        };
        assert_eq!(a, b);
    }

    #[test]
    fn service_record_differs_on_target() {
        let a = ServiceRecord {
            name: ServiceName::from("web"),
            target: PathBuf::from("/nix/store/aaa-web/run"),
        };
        let b = ServiceRecord {
            name: ServiceName::from("web"),
            target: PathBuf::from("/nix/store/bbb-web/run"),
        };
        assert_ne!(a, b);
    }

    #[test]
    fn pool_state_parses_known_states() {
        assert_eq!("ok".parse::<PoolState>(), Ok(PoolState::Ok));
        assert_eq!("outdated".parse::<PoolState>(), Ok(PoolState::Outdated));
        assert_eq!(
            "incompatible".parse::<PoolState>(),
            Ok(PoolState::Incompatible)
        );
        assert!("OK".parse::<PoolState>().is_err());
    }

    #[test]
    fn reload_signals_default_to_generic_reload() {
        let signals = ReloadSignals::default();
        assert_eq!(signals.signal_for(&ServiceName::from("lxcfs")), "1");
        assert_eq!(signals.signal_for(&ServiceName::from("nginx")), "reload");
        assert!(signals.contains(&ServiceName::from("lxcfs")));
        assert!(!signals.contains(&ServiceName::from("nginx")));
    }

    #[test]
    fn reload_signals_extend_overrides_per_name() {
        let mut signals = ReloadSignals::default();
        let mut extra = ReloadSignals::empty();
        extra.insert(ServiceName::from("lxcfs"), "hup");
        extra.insert(ServiceName::from("syslog"), "reload");
        signals.extend(extra);

        assert_eq!(signals.signal_for(&ServiceName::from("lxcfs")), "hup");
        assert!(signals.contains(&ServiceName::from("syslog")));
    }

    #[test]
    fn newtype_display() {
        assert_eq!(ServiceName::from("sshd").to_string(), "sshd");
        assert_eq!(PoolName::from("tank").to_string(), "tank");
        assert_eq!(PoolState::Incompatible.to_string(), "incompatible");
    }
}
