//! Host layout of a configuration switch.
//!
//! # Locations
//!
//! ```text
//! /etc/service/<name>/run                 live services
//! /run/current-system/sw/bin/{sv,osup,osctl}
//! <system>/
//!   activate                              activation hook
//!   bin/switch-to-configuration           this program
//!   etc/service/<name>/run                staged services
//!   sw/bin/osup                           new toolchain
//!   switch-to-configuration.yaml          optional overrides
//! ```
//!
//! Every location has a default derived from `<system>`. The configuration
//! build may drop a `switch-to-configuration.yaml` next to the hook to
//! override any of them; missing keys keep their defaults.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{io_err, ConfigError};
use crate::types::ReloadSignals;

/// File name of the optional override file inside the system tree.
pub const CONFIG_FILE: &str = "switch-to-configuration.yaml";

const SERVICE_DIR: &str = "/etc/service";
const CURRENT_BIN: &str = "/run/current-system/sw/bin";

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Every filesystem location the engine reads or invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Root of the configuration being activated.
    pub system: PathBuf,
    /// Live service directory.
    pub service_dir: PathBuf,
    /// Staged service directory of the new configuration.
    pub new_service_dir: PathBuf,
    /// Toolchain of the running configuration.
    pub current_bin: PathBuf,
    /// Toolchain of the new configuration.
    pub new_bin: PathBuf,
    /// Activation hook.
    pub activate: PathBuf,
    pub reload_signals: ReloadSignals,
}

impl Layout {
    /// Default layout for the configuration tree at `system`.
    pub fn for_system(system: impl Into<PathBuf>) -> Self {
        let system = system.into();
        Self {
            service_dir: PathBuf::from(SERVICE_DIR),
            new_service_dir: system.join("etc").join("service"),
            current_bin: PathBuf::from(CURRENT_BIN),
            new_bin: system.join("sw").join("bin"),
            activate: system.join("activate"),
            reload_signals: ReloadSignals::default(),
            system,
        }
    }

    /// `<current_bin>/sv`
    pub fn sv(&self) -> PathBuf {
        self.current_bin.join("sv")
    }

    /// `<toolchain>/osup`
    pub fn osup(toolchain: &Path) -> PathBuf {
        toolchain.join("osup")
    }

    /// `<current_bin>/osctl`
    pub fn osctl(&self) -> PathBuf {
        self.current_bin.join("osctl")
    }

    fn apply(&mut self, overrides: Overrides) {
        if let Some(v) = overrides.service_dir {
            self.service_dir = v;
        }
        if let Some(v) = overrides.new_service_dir {
            self.new_service_dir = v;
        }
        if let Some(v) = overrides.current_bin {
            self.current_bin = v;
        }
        if let Some(v) = overrides.new_bin {
            self.new_bin = v;
        }
        if let Some(v) = overrides.activate {
            self.activate = v;
        }
        if let Some(v) = overrides.reload_signals {
            self.reload_signals.extend(v);
        }
    }
}

/// On-disk shape of `switch-to-configuration.yaml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Overrides {
    service_dir: Option<PathBuf>,
    new_service_dir: Option<PathBuf>,
    current_bin: Option<PathBuf>,
    new_bin: Option<PathBuf>,
    activate: Option<PathBuf>,
    reload_signals: Option<ReloadSignals>,
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// `<system>/switch-to-configuration.yaml`. Pure, no I/O.
pub fn config_path_at(system: &Path) -> PathBuf {
    system.join(CONFIG_FILE)
}

/// Resolve the layout for `system`, applying the override file if present.
///
/// Returns `ConfigError::Parse` (with path) on malformed YAML or unknown keys.
pub fn load_at(system: &Path) -> Result<Layout, ConfigError> {
    let mut layout = Layout::for_system(system);
    let path = config_path_at(system);
    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(layout),
        Err(e) => return Err(io_err(path, e)),
    };

    if contents.trim().is_empty() {
        return Ok(layout);
    }
    // `~` or `null` means "no overrides" too.
    let overrides: Option<Overrides> = serde_yaml::from_str(&contents)
        .map_err(|source| ConfigError::Parse { path, source })?;
    layout.apply(overrides.unwrap_or_default());
    Ok(layout)
}

/// The system tree an installed binary belongs to.
///
/// The binary is installed as `<system>/bin/switch-to-configuration`.
pub fn system_from_exe(exe: &Path) -> Result<PathBuf, ConfigError> {
    exe.parent()
        .and_then(Path::parent)
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .ok_or_else(|| ConfigError::NoSystemRoot {
            exe: exe.to_path_buf(),
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_system_tree() {
        let layout = Layout::for_system("/nix/store/abc-system");
        assert_eq!(layout.service_dir, PathBuf::from("/etc/service"));
        assert_eq!(
            layout.new_service_dir,
            PathBuf::from("/nix/store/abc-system/etc/service")
        );
        assert_eq!(
            layout.current_bin,
            PathBuf::from("/run/current-system/sw/bin")
        );
        assert_eq!(layout.new_bin, PathBuf::from("/nix/store/abc-system/sw/bin"));
        assert_eq!(
            layout.activate,
            PathBuf::from("/nix/store/abc-system/activate")
        );
        assert_eq!(layout.sv(), PathBuf::from("/run/current-system/sw/bin/sv"));
    }

    #[test]
    fn system_from_exe_takes_grandparent() {
        let exe = Path::new("/nix/store/abc-system/bin/switch-to-configuration");
        assert_eq!(
            system_from_exe(exe).expect("system"),
            PathBuf::from("/nix/store/abc-system")
        );
    }

    #[test]
    fn system_from_exe_rejects_bare_name() {
        let err = system_from_exe(Path::new("switch-to-configuration")).unwrap_err();
        assert!(matches!(err, ConfigError::NoSystemRoot { .. }), "got: {err}");
    }
}
