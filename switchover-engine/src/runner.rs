//! Process boundary.
//!
//! Every external tool is reached through [`CommandRunner`], so the
//! orchestrator can be driven by an in-memory runner in tests. Calls block
//! until the child exits; there is no timeout layer.

use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Exit of a child whose output went straight to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitOutcome {
    pub success: bool,
    /// `None` when the child was killed by a signal.
    pub code: Option<i32>,
}

impl ExitOutcome {
    pub fn success() -> Self {
        Self {
            success: true,
            code: Some(0),
        }
    }

    pub fn failure(code: i32) -> Self {
        Self {
            success: false,
            code: Some(code),
        }
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {code}"),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Exit and captured output of a child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedOutput {
    pub exit: ExitOutcome,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external programs.
pub trait CommandRunner {
    /// Run with inherited stdio and wait for the exit status.
    fn status(&mut self, invocation: &Invocation) -> std::io::Result<ExitOutcome>;

    /// Run with stdout and stderr captured.
    fn capture(&mut self, invocation: &Invocation) -> std::io::Result<CapturedOutput>;
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn status(&mut self, invocation: &Invocation) -> std::io::Result<ExitOutcome> {
        tracing::debug!("exec: {invocation}");
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .status()?;
        Ok(ExitOutcome {
            success: status.success(),
            code: status.code(),
        })
    }

    fn capture(&mut self, invocation: &Invocation) -> std::io::Result<CapturedOutput> {
        tracing::debug!("exec (captured): {invocation}");
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .output()?;
        Ok(CapturedOutput {
            exit: ExitOutcome {
                success: output.status.success(),
                code: output.status.code(),
            },
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
