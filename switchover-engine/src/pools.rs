//! Storage pool probing and resolution.
//!
//! Each toolchain reports, per pool, whether it can use the pool as-is
//! (`ok`), could after running migrations (`outdated`), or cannot read it at
//! all (`incompatible`). Comparing the old and the new toolchain's view tells
//! us which pools need an upgrade after the switch and which must be rolled
//! back before it.

use std::io::ErrorKind;
use std::path::Path;

use switchover_core::{Layout, PoolMap, PoolName, PoolRecord, PoolState};

use crate::runner::{CommandRunner, Invocation};
use crate::SwitchError;

// ---------------------------------------------------------------------------
// Probe
// ---------------------------------------------------------------------------

/// Result of probing one toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// `osup` ran and reported these pools.
    Found(PoolMap),
    /// The toolchain has no `osup`; it predates pool versioning.
    Absent,
}

impl ProbeOutcome {
    pub fn into_pools(self) -> PoolMap {
        match self {
            ProbeOutcome::Found(pools) => pools,
            ProbeOutcome::Absent => PoolMap::new(),
        }
    }
}

/// Run `<toolchain>/osup check` and parse its report.
pub fn probe(runner: &mut dyn CommandRunner, toolchain: &Path) -> Result<ProbeOutcome, SwitchError> {
    let program = Layout::osup(toolchain);
    let invocation = Invocation::new(&program).arg("check");

    let output = match runner.capture(&invocation) {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound && is_missing(&program) => {
            tracing::info!("{} not found, assuming no versioned pools", program.display());
            return Ok(ProbeOutcome::Absent);
        }
        Err(source) => return Err(SwitchError::ProbeSpawn { program, source }),
    };

    if !output.exit.success {
        return Err(SwitchError::ProbeFailed {
            program,
            status: output.exit.to_string(),
            stderr: output.stderr,
        });
    }

    parse_check_output(&program, &output.stdout).map(ProbeOutcome::Found)
}

/// Spawning also reports `NotFound` for a present `osup` whose interpreter
/// is missing; only a missing entry itself means the tool is absent.
fn is_missing(program: &Path) -> bool {
    matches!(
        std::fs::symlink_metadata(program),
        Err(e) if e.kind() == ErrorKind::NotFound
    )
}

/// Parse `osup check` output: one `<name> <state> <version>` per line.
///
/// Blank lines are skipped; anything else that does not parse fails the
/// whole probe. A pool listed twice keeps its last line.
pub fn parse_check_output(program: &Path, stdout: &str) -> Result<PoolMap, SwitchError> {
    let mut pools = PoolMap::new();

    for (idx, line) in stdout.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let malformed = || SwitchError::MalformedProbeLine {
            program: program.to_path_buf(),
            line_no: idx + 1,
            line: trimmed.to_string(),
        };

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let [name, state, version] = fields.as_slice() else {
            return Err(malformed());
        };
        let state: PoolState = state.parse().map_err(|_| malformed())?;

        let name = PoolName::from(*name);
        pools.insert(
            name.clone(),
            PoolRecord {
                name,
                state,
                rollback_version: (*version).to_string(),
            },
        );
    }

    Ok(pools)
}

// ---------------------------------------------------------------------------
// Resolve
// ---------------------------------------------------------------------------

/// Disjoint classification of every pool reported by the new toolchain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolResolution {
    pub uptodate: Vec<PoolRecord>,
    /// Exported before the switch, upgraded by the restarted daemon.
    pub to_upgrade: Vec<PoolRecord>,
    /// Exported and rolled back with the old toolchain before the switch.
    pub to_rollback: Vec<PoolRecord>,
    /// Left untouched; needs an operator.
    pub error: Vec<PoolRecord>,
}

impl PoolResolution {
    /// Pools that must be exported: rollbacks first, then upgrades.
    pub fn to_export(&self) -> impl Iterator<Item = &PoolRecord> {
        self.to_rollback.iter().chain(&self.to_upgrade)
    }

    pub fn error_names(&self) -> Vec<PoolName> {
        self.error.iter().map(|p| p.name.clone()).collect()
    }
}

/// Classify `new` pools against `old`.
///
/// An `incompatible` pool is only rolled back when the old toolchain reports
/// it `ok`; the new toolchain is then older than the pool's format.
pub fn resolve(old: &PoolMap, new: &PoolMap) -> PoolResolution {
    let mut resolution = PoolResolution::default();

    for (name, pool) in new {
        let bucket = match pool.state {
            PoolState::Ok => &mut resolution.uptodate,
            PoolState::Outdated => &mut resolution.to_upgrade,
            PoolState::Incompatible => match old.get(name) {
                Some(previous) if previous.state == PoolState::Ok => &mut resolution.to_rollback,
                _ => &mut resolution.error,
            },
        };
        bucket.push(pool.clone());
    }

    resolution
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
