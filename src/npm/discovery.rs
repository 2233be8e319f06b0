//! Command discovery: which subcommands does the installed npm support?
//!
//! Discovery locates the binary, runs `npm -l` silently and scrapes the command
//! names from its free-form output. A line names a command when it starts with
//! exactly four whitespace characters followed by a run of word/hyphen characters:
//!
//! ```text
//!     install   Install a package        <- "install"
//!     dist-tag  Modify package tags      <- "dist-tag"
//!   not-a-command                        <- skipped (two spaces)
//! ```
//!
//! Lines that do not match are skipped without error; the listing format differs
//! between npm versions.
//!
//! Each name is also registered under its method identifier (`dist-tag` →
//! `distTag`) so callers can dispatch with either spelling.

use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, OnceLock};

use super::runner::{CommandRunner, Invocation, ShellRunner};
use crate::constants::{LIST_COMMANDS_FLAG, NPM_BINARY_NAME, NPM_PATH_ENV};
use crate::utils::platform::find_executable;

static COMMAND_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s{4}((?-u:[\w-])+)(?-u:\b)").expect("command line pattern is valid"));

static LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\r\n]").expect("line break pattern is valid"));

static GLOBAL: OnceLock<Arc<Discovery>> = OnceLock::new();

/// Extracts command names from npm's command listing, in order.
///
/// Duplicates are kept.
///
/// ```rust
/// use npmcall::npm::discovery::parse_command_list;
///
/// let listing = "Usage:\n    install   Install a package\n  not-a-command\n    dist-tag\n";
/// assert_eq!(parse_command_list(listing), vec!["install", "dist-tag"]);
/// ```
#[must_use]
pub fn parse_command_list(text: &str) -> Vec<String> {
    LINE_BREAK
        .split(text)
        .map(|line| {
            COMMAND_LINE
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map_or("", |m| m.as_str())
                .trim()
        })
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Folds a kebab-case command name into its camelCase method identifier.
///
/// Every hyphen is removed and the character after it is upper-cased.
///
/// ```rust
/// use npmcall::npm::discovery::method_identifier;
///
/// assert_eq!(method_identifier("dist-tag"), "distTag");
/// assert_eq!(method_identifier("install"), "install");
/// assert_eq!(method_identifier("install-ci-test"), "installCiTest");
/// ```
#[must_use]
pub fn method_identifier(name: &str) -> String {
    let mut method = String::with_capacity(name.len());
    let mut upper_next = false;

    for c in name.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            method.extend(c.to_uppercase());
            upper_next = false;
        } else {
            method.push(c);
        }
    }

    method
}

/// The discovered commands and their method identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandRegistry {
    commands: Vec<String>,
    methods: HashMap<String, String>,
}

impl CommandRegistry {
    /// Registers every name in order. A repeated name re-registers its method.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut registry = Self::default();
        for name in names {
            let name = name.into();
            let method = method_identifier(&name);
            tracing::trace!(target: "npm", "Registering '{}' as {}", name, method);
            registry.methods.insert(method, name.clone());
            registry.commands.push(name);
        }
        registry
    }

    /// Command names in discovery order.
    #[must_use]
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Resolves a method identifier or a command name to the command name.
    ///
    /// Method identifiers are tried first.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.methods
            .get(name)
            .map(String::as_str)
            .or_else(|| self.commands.iter().find(|c| *c == name).map(String::as_str))
    }

    /// `true` if `name` resolves to a discovered command.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// `(method identifier, command name)` pairs in discovery order, one per method.
    pub fn methods(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        let mut seen = std::collections::HashSet::new();
        self.commands.iter().filter_map(move |name| {
            let method = method_identifier(name);
            seen.insert(method.clone()).then_some((method, name.as_str()))
        })
    }

    /// Number of registered command names, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// `true` if nothing was discovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// The binary location and registry found by one discovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    binary: Option<PathBuf>,
    registry: CommandRegistry,
}

impl Discovery {
    /// Locates npm (honouring `NPMCALL_NPM`) and lists its commands with `runner`.
    pub fn discover(runner: &dyn CommandRunner) -> Self {
        Self::discover_at(locate_binary(), runner)
    }

    /// Lists the commands of a known binary with `runner`.
    ///
    /// A missing binary or a listing that cannot be run yields an empty registry.
    pub fn discover_at(binary: Option<PathBuf>, runner: &dyn CommandRunner) -> Self {
        let listing = match &binary {
            Some(path) => list_commands(path, runner),
            None => {
                tracing::debug!(target: "npm", "npm not found, no commands registered");
                String::new()
            }
        };
        Self::from_listing(binary, &listing)
    }

    /// Builds a discovery from listing text that was captured elsewhere.
    pub fn from_listing(binary: Option<PathBuf>, listing: &str) -> Self {
        let registry = CommandRegistry::from_names(parse_command_list(listing));
        tracing::debug!(target: "npm", "Discovered {} npm commands", registry.len());
        Self {
            binary,
            registry,
        }
    }

    /// The process-wide discovery, performed on first use with [`ShellRunner`].
    pub fn global() -> Arc<Self> {
        GLOBAL.get_or_init(|| Arc::new(Self::discover(&ShellRunner::new()))).clone()
    }

    /// Resolved npm binary, if any.
    #[must_use]
    pub fn binary(&self) -> Option<&Path> {
        self.binary.as_deref()
    }

    /// Discovered commands.
    #[must_use]
    pub const fn registry(&self) -> &CommandRegistry {
        &self.registry
    }
}

/// `NPMCALL_NPM` if set and non-empty, otherwise `npm` on `PATH`.
#[must_use]
pub fn locate_binary() -> Option<PathBuf> {
    match std::env::var_os(NPM_PATH_ENV) {
        Some(path) if !path.is_empty() => Some(PathBuf::from(path)),
        _ => find_executable(NPM_BINARY_NAME),
    }
}

fn list_commands(binary: &Path, runner: &dyn CommandRunner) -> String {
    let line = format!("{} {}", binary.display(), LIST_COMMANDS_FLAG);
    let dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    tracing::debug!(target: "npm", "Listing commands: {}", line);

    match runner.run_blocking(&Invocation::new(line, dir)) {
        Ok(result) => result.output,
        Err(e) => {
            tracing::warn!(target: "npm", "Failed to list npm commands: {}", e);
            String::new()
        }
    }
}
