//! Command-line interface for npmcall.
//!
//! The `npmcall` binary exposes the library facade from a shell:
//!
//! - `run` - run a discovered npm command by name or method identifier
//! - `commands` - list the commands the installed npm reports
//! - `which` - print the npm binary in use
//! - `config` - create, show or locate the global config file
//!
//! # Global Options
//!
//! All subcommands accept:
//! - `--verbose` / `--quiet` - log verbosity
//! - `--config` - path to a custom config file (default `~/.npmcall/config.toml`)
//! - `--dir` - directory npm runs in (default: the current directory)
//! - `--npm` - npm binary to use instead of the one on `PATH`
//! - `--registry`, `--username`, `--password`, `--userconfig` - flags appended to
//!   every npm invocation, overriding the config file
//! - `--no-silent` - echo npm's output while it runs
//!
//! # Example
//!
//! ```bash
//! npmcall --dir ./web run install left-pad
//! npmcall run distTag ls left-pad
//! npmcall commands --json
//! ```

mod commands;
mod config;
mod run;
mod which;


use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{GlobalConfig, NpmOptions};
use crate::npm::Npm;
use crate::npm::discovery::{Discovery, locate_binary};
use crate::npm::runner::ShellRunner;
use crate::utils::platform::resolve_path;

/// Runtime configuration derived from the global flags.
///
/// Kept apart from [`Cli`] so tests and embedders can drive
/// [`Cli::execute_with_config`] without touching the process environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,

    /// Custom path to the global configuration file.
    pub config_path: Option<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            config_path: None,
        }
    }
}

impl CliConfig {
    /// Create a configuration with the `warn` level and the default config location.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Main CLI structure for npmcall.
#[derive(Parser, Debug)]
#[command(
    name = "npmcall",
    about = "Run npm commands through a scriptable facade",
    version,
    author,
    long_about = "npmcall discovers the commands of the installed npm and runs them with \
                  consistent flags, working directory and error reporting."
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (equivalent to `RUST_LOG=debug`).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to custom global configuration file.
    ///
    /// Overrides `NPMCALL_CONFIG` and the default `~/.npmcall/config.toml`.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory npm runs in. `~` and environment variables are expanded.
    #[arg(short = 'C', long, global = true)]
    dir: Option<String>,

    /// npm binary to use instead of the one found on `PATH`.
    #[arg(long, global = true, env = "NPMCALL_NPM")]
    npm: Option<PathBuf>,

    /// Registry URL passed as `--registry`.
    #[arg(long, global = true)]
    registry: Option<String>,

    /// Username passed as `--username`.
    #[arg(long, global = true)]
    username: Option<String>,

    /// Password passed as `--password`.
    #[arg(long, global = true)]
    password: Option<String>,

    /// User config file passed as `--userconfig`.
    #[arg(long, global = true)]
    userconfig: Option<String>,

    /// Echo npm's output to the terminal while it runs.
    #[arg(long, global = true)]
    no_silent: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run an npm command by name or method identifier.
    ///
    /// See [`run::RunCommand`].
    Run(run::RunCommand),

    /// List the commands reported by the installed npm.
    ///
    /// See [`commands::CommandsCommand`].
    Commands(commands::CommandsCommand),

    /// Print the npm binary in use.
    Which(which::WhichCommand),

    /// Manage the global configuration file.
    ///
    /// See [`config::ConfigCommand`].
    Config(config::ConfigCommand),
}

impl Cli {
    /// Build a [`CliConfig`] from the parsed global flags.
    ///
    /// `--verbose` maps to `debug`, `--quiet` to `error`, anything else to `warn`.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            config_path: self.config.clone(),
        }
    }

    /// Execute the CLI with an explicit configuration.
    ///
    /// `config` never runs npm, so it skips discovery.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        if let Commands::Config(cmd) = &self.command {
            let seed = GlobalConfig {
                npm_path: self.npm.clone(),
                options: self.flag_options(),
            };
            return cmd.execute(config.config_path, seed).await;
        }

        let npm = self.build_npm(&config).await?;

        match self.command {
            Commands::Run(cmd) => cmd.execute(&npm).await,
            Commands::Commands(cmd) => cmd.execute(&npm),
            Commands::Which(cmd) => cmd.execute(&npm),
            Commands::Config(_) => Ok(()),
        }
    }

    /// Options given on the command line; unset flags leave config values alone.
    fn flag_options(&self) -> NpmOptions {
        NpmOptions {
            username: self.username.clone(),
            password: self.password.clone(),
            registry: self.registry.clone(),
            userconfig: self.userconfig.clone(),
            silent: self.no_silent.then_some(false),
            ..NpmOptions::default()
        }
    }

    /// Loads the config file, layers the flags over it and discovers npm.
    ///
    /// The binary comes from `--npm` (or `NPMCALL_NPM`), then the config file's
    /// `npm_path`, then `PATH`.
    async fn build_npm(&self, config: &CliConfig) -> Result<Npm> {
        let global = GlobalConfig::load_with_optional(config.config_path.clone())
            .await
            .context("Failed to load npmcall configuration")?;

        let mut options = global.options;
        options.merge(self.flag_options());

        let binary = self.npm.clone().or(global.npm_path).or_else(locate_binary);
        match &binary {
            Some(path) => tracing::debug!("Using npm binary: {}", path.display()),
            None => tracing::debug!("No npm binary found"),
        }

        let discovery =
            tokio::task::spawn_blocking(move || Discovery::discover_at(binary, &ShellRunner::new()))
                .await
                .context("Command discovery task failed")?;

        let dir = match &self.dir {
            Some(dir) => resolve_path(dir)?,
            None => std::env::current_dir().context("Failed to read the current directory")?,
        };

        Ok(Npm::with_parts(dir, options, Arc::new(discovery), Arc::new(ShellRunner::new())))
    }
}
