//! Global configuration file for npmcall.
//!
//! The file lives at `~/.npmcall/config.toml` unless `--config` or `NPMCALL_CONFIG`
//! points elsewhere. A missing file is not an error; defaults are used.
//!
//! ```toml
//! # Use a specific npm instead of the one on PATH
//! npm_path = "/opt/node/bin/npm"
//!
//! [options]
//! registry = "https://registry.example.com"
//! silent = true
//! ```
//!
//! The file may contain registry credentials, so it is written with owner-only
//! permissions on Unix.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use super::options::NpmOptions;
use crate::constants::CONFIG_PATH_ENV;

/// Contents of the global configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Explicit npm binary; skips the `PATH` lookup when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npm_path: Option<PathBuf>,

    /// Default options applied to every invocation
    pub options: NpmOptions,
}

impl GlobalConfig {
    /// The file to use: `path` if given, then `NPMCALL_CONFIG`, then the default.
    pub fn resolve_location(path: Option<PathBuf>) -> Result<PathBuf> {
        match path {
            Some(path) => Ok(path),
            None => match std::env::var_os(CONFIG_PATH_ENV) {
                Some(path) => Ok(PathBuf::from(path)),
                None => Self::default_path(),
            },
        }
    }

    /// Load from `path` if given, else from the default location.
    ///
    /// `NPMCALL_CONFIG` is consulted before the default location.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = Self::resolve_location(path)?;

        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!(target: "npm", "No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Write the configuration to `path`, creating parent directories.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(path)
                .await
                .with_context(|| format!("Failed to read permissions for {}", path.display()))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).await.with_context(|| {
                format!("Failed to set secure permissions on {}", path.display())
            })?;
        }

        Ok(())
    }

    /// `~/.npmcall/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".npmcall").join("config.toml"))
    }
}
