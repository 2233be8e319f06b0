//! Builder for npm command lines with consistent execution and error handling
//!
//! [`NpmCommand`] composes the full command line for one npm subcommand and runs
//! it through a [`CommandRunner`]. The line always has the same shape:
//!
//! ```text
//! <binary> <command> [params] [--username U] [--password P] [--registry R] [--userconfigC] --always-auth --no-strict-ssl
//! ```
//!
//! Parameters are appended verbatim; only the surrounding whitespace is trimmed so
//! exactly one space separates them from the flags.
//!
//! # Examples
//!
//! ```rust,no_run
//! use npmcall::config::NpmOptions;
//! use npmcall::npm::command_builder::NpmCommand;
//! use npmcall::npm::runner::ShellRunner;
//! use std::path::Path;
//!
//! let options = NpmOptions::new().registry("http://localhost:4873");
//! let output = NpmCommand::new(Some(Path::new("/usr/bin/npm")), "view")
//!     .params("left-pad version")
//!     .options(&options)
//!     .current_dir("/path/to/project")
//!     .execute_sync(&ShellRunner::new())?;
//! # Ok::<(), npmcall::core::NpmError>(())
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::runner::{CommandRunner, ExecutionResult, Invocation};
use crate::config::{NpmOptions, ResolvedExec};
use crate::constants::{ALWAYS_FLAGS, NOT_FOUND_EXIT_CODE, NPM_BINARY_NAME, SLOW_INVOCATION_SECS};
use crate::core::{NpmError, Result};

/// Builder for one npm invocation.
///
/// Defaults: no parameters, no option flags, the process's current directory and
/// silent execution.
#[derive(Debug, Clone)]
pub struct NpmCommand {
    /// Resolved binary; `None` makes execution fail as "command not found"
    binary: Option<PathBuf>,

    /// The npm subcommand (`install`, `dist-tag`, ...)
    command: String,

    /// Raw parameter string, appended verbatim
    params: Option<String>,

    /// Option-derived flags, each followed by a space
    flags: String,

    /// Password value, masked in diagnostics
    password: Option<String>,

    /// Working directory for the process
    current_dir: Option<PathBuf>,

    /// Runner settings
    exec: ResolvedExec,
}

impl NpmCommand {
    /// Starts a command for `command` run by `binary`.
    pub fn new(binary: Option<&Path>, command: impl Into<String>) -> Self {
        Self {
            binary: binary.map(Path::to_path_buf),
            command: command.into(),
            params: None,
            flags: String::new(),
            password: None,
            current_dir: None,
            exec: NpmOptions::default().exec_settings(),
        }
    }

    /// Sets the raw parameter string.
    pub fn params(mut self, params: impl Into<String>) -> Self {
        self.params = Some(params.into());
        self
    }

    /// Sets the raw parameter string if one is given.
    pub fn maybe_params(mut self, params: Option<&str>) -> Self {
        self.params = params.map(str::to_string);
        self
    }

    /// Applies default flags and runner settings from `options`.
    pub fn options(mut self, options: &NpmOptions) -> Self {
        self.flags = options.flags();
        self.password = options.password.clone().filter(|p| !p.is_empty());
        self.exec = options.exec_settings();
        self
    }

    /// Sets the working directory the process runs in.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Composes the full command line.
    ///
    /// ```rust
    /// use npmcall::config::NpmOptions;
    /// use npmcall::npm::command_builder::NpmCommand;
    /// use std::path::Path;
    ///
    /// let line = NpmCommand::new(Some(Path::new("npm")), "install")
    ///     .params("  left-pad  ")
    ///     .options(&NpmOptions::new().username("u"))
    ///     .line();
    /// assert_eq!(line, "npm install left-pad --username u --always-auth --no-strict-ssl");
    /// ```
    #[must_use]
    pub fn line(&self) -> String {
        let binary = self.binary.as_ref().map(|b| b.display().to_string()).unwrap_or_default();

        let mut line = format!("{binary} {} ", self.command);
        if let Some(params) = &self.params {
            line.push_str(params);
        }

        let mut line = line.trim().to_string();
        line.push(' ');
        line.push_str(&self.flags);
        line.push_str(ALWAYS_FLAGS);
        line
    }

    /// The command line with the password value masked, for diagnostics.
    #[must_use]
    pub fn redacted_line(&self) -> String {
        let line = self.line();
        match &self.password {
            Some(password) => {
                line.replace(&format!("--password {password} "), "--password **** ")
            }
            None => line,
        }
    }

    /// The invocation handed to the runner.
    #[must_use]
    pub fn invocation(&self) -> Invocation {
        let dir = self.current_dir.clone().unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        });
        Invocation {
            line: self.line(),
            dir,
            silent: self.exec.silent,
            env: self.exec.env.clone(),
            timeout: self.exec.timeout,
        }
    }

    /// Runs the command, blocking until npm exits.
    ///
    /// Returns npm's combined output, or [`NpmError::CommandExecution`] when it exits
    /// non-zero.
    pub fn execute_sync(self, runner: &dyn CommandRunner) -> Result<String> {
        let start = Instant::now();
        let result = match self.prepare() {
            Some(invocation) => runner
                .run_blocking(&invocation)
                .map_err(|e| NpmError::io(format!("run npm {}", self.command), e))?,
            None => missing_binary(),
        };
        self.finish(result, start)
    }

    /// Runs the command without blocking the calling thread.
    pub async fn execute(self, runner: &dyn CommandRunner) -> Result<String> {
        let start = Instant::now();
        let result = match self.prepare() {
            Some(invocation) => runner
                .run(&invocation)
                .await
                .map_err(|e| NpmError::io(format!("run npm {}", self.command), e))?,
            None => missing_binary(),
        };
        self.finish(result, start)
    }

    /// Logs the command and builds the invocation, or `None` if there is no binary.
    fn prepare(&self) -> Option<Invocation> {
        if self.binary.is_none() {
            tracing::debug!(
                target: "npm",
                "Cannot run '{}': {} was not found",
                self.command,
                NPM_BINARY_NAME
            );
            return None;
        }

        let invocation = self.invocation();
        tracing::debug!(
            target: "npm",
            "Executing command: {} (in {})",
            self.redacted_line(),
            invocation.dir.display()
        );
        Some(invocation)
    }

    fn finish(&self, result: ExecutionResult, start: Instant) -> Result<String> {
        let elapsed = start.elapsed();
        if elapsed.as_secs() >= SLOW_INVOCATION_SECS {
            tracing::info!(
                target: "npm::perf",
                "npm {} took {:.2}s",
                self.command,
                elapsed.as_secs_f64()
            );
        } else {
            tracing::trace!(target: "npm::perf", "npm {} took {}ms", self.command, elapsed.as_millis());
        }

        into_output(result)
    }
}

/// Applies the exit-code policy to a finished run.
///
/// Zero exit returns the output; anything else becomes
/// [`NpmError::CommandExecution`].
pub fn into_output(result: ExecutionResult) -> Result<String> {
    if result.success() {
        return Ok(result.output);
    }

    tracing::debug!(target: "npm", "Command failed with exit code: {}", result.exit_code);
    if !result.output.is_empty() {
        tracing::debug!(target: "npm", "Error output: {}", result.output.trim());
    }
    Err(NpmError::from_exit(result.exit_code, &result.output))
}

/// What a shell reports when the binary does not exist.
fn missing_binary() -> ExecutionResult {
    ExecutionResult::new(NOT_FOUND_EXIT_CODE, format!("{NPM_BINARY_NAME}: command not found"))
}
