//! switch-to-configuration — activate a newly built host configuration.
//!
//! # Usage
//!
//! ```text
//! <system>/bin/switch-to-configuration switch|boot|test
//! <system>/bin/switch-to-configuration dry-activate
//! ```
//!
//! The configuration being activated is the tree the binary is installed in.

mod console;

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use switchover_core::config;
use switchover_engine::{pipeline, RunMode, SystemRunner};

use console::ConsoleReporter;

/// Exit status of a switch that completed with failed service actions.
const EXIT_ACTIONS_FAILED: u8 = 4;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "switch-to-configuration",
    about = "Switch the running system to this configuration",
    long_about = None,
)]
struct Cli {
    /// What to do with the configuration.
    #[arg(value_enum)]
    action: Action,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Action {
    /// Activate the configuration now.
    Switch,
    /// Same as `switch`.
    Boot,
    /// Same as `switch`.
    Test,
    /// Print what `switch` would do without doing it.
    DryActivate,
}

impl Action {
    fn mode(self) -> RunMode {
        match self {
            Action::Switch | Action::Boot | Action::Test => RunMode::Live,
            Action::DryActivate => RunMode::DryRun,
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    let exe = std::env::current_exe()
        .and_then(std::fs::canonicalize)
        .context("could not determine executable path")?;
    let system = config::system_from_exe(&exe)?;
    let layout = config::load_at(&system)
        .with_context(|| format!("invalid configuration at {}", system.display()))?;
    tracing::debug!(?layout, "resolved layout");

    let mut runner = SystemRunner;
    let mut reporter = ConsoleReporter::stdout();
    let report = pipeline::run(&layout, cli.action.mode(), &mut runner, &mut reporter)
        .context("switch to configuration failed")?;

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        reporter.summarize_failures(&report);
        Ok(ExitCode::from(EXIT_ACTIONS_FAILED))
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
