//! Per-instance npm options.
//!
//! [`NpmOptions`] supplies the default flags every invocation carries and the
//! settings handed to the process runner. It deserializes from the `[options]`
//! table of the configuration file:
//!
//! ```toml
//! [options]
//! registry = "https://registry.example.com"
//! username = "ci"
//! silent = false
//!
//! [options.exec]
//! timeout_secs = 600
//!
//! [options.exec.env]
//! NODE_ENV = "production"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// How the `--userconfig` flag is joined to its value.
///
/// npm has historically been invoked with `--userconfig<value>` (no separating
/// space). That form is kept as the default for compatibility; `Separated` emits
/// `--userconfig <value>` like every other flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserconfigStyle {
    /// `--userconfig<value>`
    #[default]
    Attached,
    /// `--userconfig <value>`
    Separated,
}

/// Settings passed through to the process runner.
///
/// These are merged over the base derived from [`NpmOptions::silent`]; values set
/// here win.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecSettings {
    /// Overrides [`NpmOptions::silent`] when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,

    /// Extra environment variables for the npm process
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    /// Kill the process after this many seconds (no limit when unset)
    ///
    /// Only npm itself is killed. Output read before the kill is kept, and children
    /// npm started may keep running until they exit on their own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

/// Default configuration for an [`Npm`](crate::npm::Npm) instance.
///
/// String options only produce a flag when they are present and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NpmOptions {
    /// Adds `--username <value>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Adds `--password <value>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Adds `--registry <value>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    /// Adds `--userconfig<value>` (see [`UserconfigStyle`])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userconfig: Option<String>,

    /// Suppress npm's output on the console while it runs (default `true`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub silent: Option<bool>,

    /// Runner-specific settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exec: Option<ExecSettings>,

    /// Spacing of the `--userconfig` flag
    pub userconfig_style: UserconfigStyle,
}

impl NpmOptions {
    /// Creates empty options: no extra flags, silent execution.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `--username` value.
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Sets the `--password` value.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the `--registry` value.
    #[must_use]
    pub fn registry(mut self, registry: impl Into<String>) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Sets the `--userconfig` value.
    #[must_use]
    pub fn userconfig(mut self, userconfig: impl Into<String>) -> Self {
        self.userconfig = Some(userconfig.into());
        self
    }

    /// Sets whether output is suppressed during execution.
    #[must_use]
    pub const fn silent(mut self, silent: bool) -> Self {
        self.silent = Some(silent);
        self
    }

    /// Sets the runner-specific settings.
    #[must_use]
    pub fn exec(mut self, exec: ExecSettings) -> Self {
        self.exec = Some(exec);
        self
    }

    /// Sets the `--userconfig` spacing.
    #[must_use]
    pub const fn userconfig_style(mut self, style: UserconfigStyle) -> Self {
        self.userconfig_style = style;
        self
    }

    /// Renders the option-derived flags in their fixed order.
    ///
    /// Every flag is followed by a single space so further flags can be appended
    /// directly.
    #[must_use]
    pub fn flags(&self) -> String {
        let mut flags = String::new();

        if let Some(username) = truthy(self.username.as_deref()) {
            flags.push_str(&format!("--username {username} "));
        }
        if let Some(password) = truthy(self.password.as_deref()) {
            flags.push_str(&format!("--password {password} "));
        }
        if let Some(registry) = truthy(self.registry.as_deref()) {
            flags.push_str(&format!("--registry {registry} "));
        }
        if let Some(userconfig) = truthy(self.userconfig.as_deref()) {
            match self.userconfig_style {
                UserconfigStyle::Attached => flags.push_str(&format!("--userconfig{userconfig} ")),
                UserconfigStyle::Separated => {
                    flags.push_str(&format!("--userconfig {userconfig} "));
                }
            }
        }

        flags
    }

    /// Resolves the execution settings: `exec` values over a base of `silent`.
    #[must_use]
    pub fn exec_settings(&self) -> ResolvedExec {
        let exec = self.exec.clone().unwrap_or_default();
        ResolvedExec {
            silent: exec.silent.or(self.silent).unwrap_or(true),
            env: exec.env.into_iter().collect(),
            timeout: exec.timeout_secs.map(Duration::from_secs),
        }
    }

    /// Overlays every value that is set in `other` onto `self`.
    ///
    /// Used to let command-line flags override values from the configuration file.
    pub fn merge(&mut self, other: Self) {
        if other.username.is_some() {
            self.username = other.username;
        }
        if other.password.is_some() {
            self.password = other.password;
        }
        if other.registry.is_some() {
            self.registry = other.registry;
        }
        if other.userconfig.is_some() {
            self.userconfig = other.userconfig;
        }
        if other.silent.is_some() {
            self.silent = other.silent;
        }
        if other.exec.is_some() {
            self.exec = other.exec;
        }
        if other.userconfig_style != UserconfigStyle::default() {
            self.userconfig_style = other.userconfig_style;
        }
    }
}

/// Execution settings after merging [`ExecSettings`] over the base options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedExec {
    /// Whether output is kept off the console
    pub silent: bool,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
    /// Optional kill deadline
    pub timeout: Option<Duration>,
}

fn truthy(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
