//! Terminal rendering of switch progress.

use std::io::Write;

use colored::Colorize;

use switchover_engine::{Event, Reporter, SwitchReport};

/// Prints progress on stdout and warnings on stderr.
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl ConsoleReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write> ConsoleReporter<W> {
    /// Line for a progress event; `None` for warnings.
    fn progress_line(event: &Event) -> Option<String> {
        match event {
            Event::Probing(subject) => Some(subject.announcement().to_string()),
            Event::PhaseStarted { phase, mode } => {
                Some(phase.announcement(*mode).bold().to_string())
            }
            Event::Step(step) => Some(step.to_string()),
            Event::UnresolvedPools(_) | Event::ActionFailed(_) => None,
        }
    }

    fn warning_line(event: &Event) -> Option<String> {
        match event {
            Event::UnresolvedPools(pools) => {
                let names: Vec<&str> = pools.iter().map(|p| p.0.as_str()).collect();
                Some(
                    format!("unable to handle pools: {}", names.join(","))
                        .yellow()
                        .to_string(),
                )
            }
            Event::ActionFailed(failure) => Some(
                format!("  {} failed: {}", failure.step, failure.reason)
                    .red()
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Repeat every failed action once the switch has finished.
    pub fn summarize_failures(&mut self, report: &SwitchReport) {
        let _ = self.out.flush();
        eprintln!(
            "{}",
            format!("switch finished with {} failed action(s):", report.failures.len())
                .red()
                .bold()
        );
        for failure in &report.failures {
            eprintln!("  {} ({})", failure.step, failure.reason);
        }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report(&mut self, event: &Event) {
        if let Some(line) = Self::progress_line(event) {
            let _ = writeln!(self.out, "{line}");
        }
        if let Some(line) = Self::warning_line(event) {
            // Keep warnings in sequence with the progress already printed.
            let _ = self.out.flush();
            eprintln!("{line}");
        }
    }
}
