//! The external executor boundary: one blocking call per script.

use crate::runtime::resolve_executor_program;
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Captured result of running a script.
pub struct ScriptOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs fully formed script text.
///
/// Implementations block until the script finishes; there is no timeout or
/// cancellation at this layer. An `Err` means the script could not be run at
/// all, as opposed to running and failing.
pub trait ScriptExecutor {
    fn run(&self, script: &str) -> Result<ScriptOutput>;
}

impl<T: ScriptExecutor + ?Sized> ScriptExecutor for &T {
    fn run(&self, script: &str) -> Result<ScriptOutput> {
        (**self).run(script)
    }
}

impl<T: ScriptExecutor + ?Sized> ScriptExecutor for Box<T> {
    fn run(&self, script: &str) -> Result<ScriptOutput> {
        (**self).run(script)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Program plus arguments for one executor invocation.
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
}

/// Executes scripts through `osascript -e <script>`.
#[derive(Clone, Debug)]
pub struct OsascriptExecutor {
    program: PathBuf,
}

impl OsascriptExecutor {
    pub fn new(explicit: Option<&Path>) -> Self {
        Self {
            program: resolve_executor_program(explicit),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn command_spec(&self, script: &str) -> CommandSpec {
        CommandSpec {
            program: self.program.as_os_str().to_os_string(),
            args: vec![OsString::from("-e"), OsString::from(script)],
        }
    }
}

impl Default for OsascriptExecutor {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ScriptExecutor for OsascriptExecutor {
    fn run(&self, script: &str) -> Result<ScriptOutput> {
        let spec = self.command_spec(script);
        let output = Command::new(&spec.program)
            .args(&spec.args)
            .output()
            .with_context(|| format!("failed to execute {}", self.program.display()))?;
        Ok(ScriptOutput {
            // Signal termination has no exit code; report it as a failure.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
