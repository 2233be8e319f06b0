//! npmcall - programmatic access to the npm command-line binary
//!
//! npmcall wraps the `npm` installed on the host so that Rust code can run npm
//! subcommands as ordinary calls. The set of commands is not hard-coded: on first
//! use the installed binary is asked for its command listing (`npm -l`) and every
//! command it reports becomes callable, under its own name (`dist-tag`) and under
//! its camelCase method identifier (`distTag`).
//!
//! # Core Modules
//!
//! - [`npm`] - the [`Npm`] facade, command discovery, line composition and the runner
//! - [`config`] - per-instance [`NpmOptions`](config::NpmOptions) and the global
//!   configuration file (`~/.npmcall/config.toml`)
//! - [`core`] - error types and user-facing error formatting
//! - [`utils`] - cross-platform path and executable helpers
//! - [`cli`] - the `npmcall` command-line front end
//!
//! # Command Lines
//!
//! Every invocation runs a line of the same shape, with the instance directory as
//! the working directory:
//!
//! ```text
//! <npm> <command> [params] [--username U] [--password P] [--registry R] [--userconfigC] --always-auth --no-strict-ssl
//! ```
//!
//! A zero exit returns npm's output (stdout then stderr). Any other exit becomes
//! [`NpmError::CommandExecution`](core::NpmError::CommandExecution) carrying the
//! trimmed output, or `Incorrect code #<n>` when npm printed nothing.
//!
//! # Example
//!
//! ```rust,no_run
//! use npmcall::config::NpmOptions;
//! use npmcall::npm;
//!
//! # async fn example() -> Result<(), npmcall::core::NpmError> {
//! let options = NpmOptions::new().registry("http://localhost:4873");
//! let mut project = npm("/path/to/project", options);
//!
//! let version = project.invoke_sync("view", Some("left-pad version"))?;
//! let tags = project.cd("packages/core").call("distTag", Some("ls")).await?;
//! # let _ = (version, tags);
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! Invocations and discovery are logged through `tracing` under the `npm` target;
//! slow invocations are reported under `npm::perf`. Passwords never appear in logs.

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod npm;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use npm::{Npm, npm};
