//! Programmatic, chainable access to the npm binary installed on the host
//!
//! An [`Npm`] instance binds a working directory and a set of default
//! [`NpmOptions`]. Every npm subcommand the installed binary reports (see
//! [`discovery`]) can then be run through it, by command name or by its camelCase
//! method identifier:
//!
//! ```rust,no_run
//! use npmcall::config::NpmOptions;
//! use npmcall::npm::npm;
//!
//! # fn example() -> Result<(), npmcall::core::NpmError> {
//! let mut project = npm("/path/to/project", NpmOptions::new());
//!
//! // Blocking; returns npm's output or fails on a non-zero exit
//! let _tree = project.invoke_sync("ls", Some("--depth=0"))?;
//!
//! // Dispatch through the discovered registry, with either spelling
//! project.cd("packages/core").call_sync("distTag", Some("ls"))?;
//! # Ok(())
//! # }
//! ```
//!
//! Asynchronous callers either await [`Npm::invoke`] or hand a completion handler
//! to [`Npm::invoke_with`], which is called exactly once with the outcome.
//!
//! # Working directory
//!
//! The directory is per instance and is handed to the runner with each invocation.
//! The process-wide current directory is never changed, so instances scoped to
//! different directories can run concurrently.

pub mod command_builder;
pub mod discovery;
pub mod runner;


use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

use self::command_builder::NpmCommand;
use self::discovery::Discovery;
use self::runner::{CommandRunner, ShellRunner};
use crate::config::NpmOptions;
use crate::core::{NpmError, Result};
use crate::utils::platform::join_normalized;

pub use self::discovery::{CommandRegistry, method_identifier, parse_command_list};
pub use self::runner::{ExecutionResult, Invocation};

/// A handle on npm scoped to a directory.
///
/// Cloning is cheap: options, discovery and runner are shared.
#[derive(Clone)]
pub struct Npm {
    dir: PathBuf,
    options: Arc<NpmOptions>,
    discovery: Arc<Discovery>,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for Npm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Npm")
            .field("dir", &self.dir)
            .field("options", &self.options)
            .field("binary", &self.discovery.binary())
            .field("commands", &self.discovery.registry().len())
            .finish_non_exhaustive()
    }
}

/// Creates an [`Npm`] instance; identical to [`Npm::new`].
pub fn npm(dir: impl Into<PathBuf>, options: NpmOptions) -> Npm {
    Npm::new(dir, options)
}

impl Npm {
    /// Creates an instance backed by the process-wide discovery and the shell runner.
    ///
    /// The first instance created in a process triggers discovery (`npm -l`).
    pub fn new(dir: impl Into<PathBuf>, options: NpmOptions) -> Self {
        Self::with_parts(dir, options, Discovery::global(), Arc::new(ShellRunner::new()))
    }

    /// Creates an instance from an explicit discovery and runner.
    pub fn with_parts(
        dir: impl Into<PathBuf>,
        options: NpmOptions,
        discovery: Arc<Discovery>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            dir: dir.into(),
            options: Arc::new(options),
            discovery,
            runner,
        }
    }

    /// Command names reported by the installed npm, in listing order.
    pub fn commands() -> Vec<String> {
        Discovery::global().registry().commands().to_vec()
    }

    /// Location of the npm binary, if one was found.
    pub fn path() -> Option<PathBuf> {
        Discovery::global().binary().map(Path::to_path_buf)
    }

    /// The directory commands run in.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// The options every invocation applies.
    #[must_use]
    pub fn options(&self) -> &NpmOptions {
        &self.options
    }

    /// The discovery this instance dispatches through.
    #[must_use]
    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// The discovered commands.
    #[must_use]
    pub fn registry(&self) -> &CommandRegistry {
        self.discovery.registry()
    }

    /// Moves the instance to `path`, resolved against the current directory.
    ///
    /// Relative segments (including `..`) are resolved lexically; an absolute path
    /// replaces the directory. Nothing is executed.
    ///
    /// ```rust
    /// use npmcall::config::NpmOptions;
    /// use npmcall::npm::Npm;
    /// use npmcall::npm::discovery::Discovery;
    /// use npmcall::npm::runner::ShellRunner;
    /// use std::path::Path;
    /// use std::sync::Arc;
    ///
    /// let mut npm = Npm::with_parts(
    ///     "/a",
    ///     NpmOptions::new(),
    ///     Arc::new(Discovery::default()),
    ///     Arc::new(ShellRunner::new()),
    /// );
    /// npm.cd("sub").cd("../other");
    /// # #[cfg(unix)]
    /// assert_eq!(npm.directory(), Path::new("/a/other"));
    /// ```
    pub fn cd(&mut self, path: impl AsRef<Path>) -> &mut Self {
        self.dir = join_normalized(&self.dir, path);
        tracing::debug!(target: "npm", "Updated the directory to {}", self.dir.display());
        self
    }

    /// The command line `command` would run with, without running it.
    #[must_use]
    pub fn command_line(&self, command: &str, params: Option<&str>) -> String {
        self.build(command, params).line()
    }

    /// Runs `command`, blocking until npm exits.
    ///
    /// `command` is used as given; see [`call_sync`](Self::call_sync) for dispatch
    /// through the registry.
    pub fn invoke_sync(&self, command: &str, params: Option<&str>) -> Result<String> {
        self.build(command, params).execute_sync(self.runner.as_ref())
    }

    /// Runs `command` without blocking the calling thread.
    pub async fn invoke(&self, command: &str, params: Option<&str>) -> Result<String> {
        self.build(command, params).execute(self.runner.as_ref()).await
    }

    /// Runs `command` on a spawned task and hands the outcome to `completion`.
    ///
    /// `completion` is called exactly once: `Ok(output)` on a zero exit, otherwise
    /// the [`NpmError`]. Must be called from within a tokio runtime.
    pub fn invoke_with<F>(&self, command: &str, params: Option<&str>, completion: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<String>) + Send + 'static,
    {
        let cmd = self.build(command, params);
        let runner = Arc::clone(&self.runner);

        tokio::spawn(async move { completion(cmd.execute(runner.as_ref()).await) })
    }

    /// Resolves `name` (command name or method identifier) and runs it blocking.
    pub fn call_sync(&self, name: &str, params: Option<&str>) -> Result<String> {
        let command = self.resolve(name)?;
        self.invoke_sync(&command, params)
    }

    /// Resolves `name` (command name or method identifier) and runs it asynchronously.
    pub async fn call(&self, name: &str, params: Option<&str>) -> Result<String> {
        let command = self.resolve(name)?;
        self.invoke(&command, params).await
    }

    /// Resolves `name` and runs it on a spawned task, reporting to `completion`.
    ///
    /// An unknown name is reported through `completion` as well.
    pub fn call_with<F>(&self, name: &str, params: Option<&str>, completion: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<String>) + Send + 'static,
    {
        match self.resolve(name) {
            Ok(command) => self.invoke_with(&command, params, completion),
            Err(e) => tokio::spawn(async move { completion(Err(e)) }),
        }
    }

    fn resolve(&self, name: &str) -> Result<String> {
        self.registry().resolve(name).map(str::to_string).ok_or_else(|| {
            NpmError::UnknownCommand {
                name: name.to_string(),
            }
        })
    }

    fn build(&self, command: &str, params: Option<&str>) -> NpmCommand {
        NpmCommand::new(self.discovery.binary(), command)
            .maybe_params(params)
            .options(&self.options)
            .current_dir(&self.dir)
    }
}
