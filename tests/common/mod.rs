//! Shared helpers for the integration suites.
//!
//! [`TestProject`] owns a temporary directory holding a project directory and a
//! fake `npm` shell script. The script answers `-l` with a listing in npm's format
//! and otherwise behaves according to its first argument:
//!
//! | command    | behavior                                         |
//! |------------|--------------------------------------------------|
//! | `fail`     | prints to stderr and exits 3                     |
//! | `mute`     | exits 4 without output                           |
//! | `pwd`      | prints the working directory                     |
//! | `printenv` | prints `$NPMCALL_TEST_VALUE`                     |
//! | `sleep`    | prints `partial`, then sleeps for 5 seconds      |
//! | `count`    | prints how many arguments follow the command     |
//! | anything   | echoes its arguments                             |

#![allow(dead_code)]

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Listing printed for `npm -l`.
pub const LISTING: &str = "
Usage: npm <command>

npm install        install all the dependencies in your project

All commands:

    access          Set access level on published packages
    dist-tag        Modify package distribution tags
    install         Install a package
    run-script      Run arbitrary package scripts
    fail
    mute
    pwd
    printenv
    sleep
    count
  not-a-command     two spaces, never registered

Specify configs in the ini-formatted file:
    /home/user/.npmrc
";

const SCRIPT_BODY: &str = r#"case "$1" in
  -l)
    cat <<'LISTING'
@LISTING@
LISTING
    ;;
  fail)
    echo "npm ERR! something broke" >&2
    exit 3
    ;;
  mute)
    exit 4
    ;;
  pwd)
    pwd
    ;;
  printenv)
    printf '%s\n' "$NPMCALL_TEST_VALUE"
    ;;
  sleep)
    printf 'partial\n'
    sleep 5
    ;;
  count)
    shift
    echo "$#"
    ;;
  *)
    echo "$@"
    ;;
esac
"#;

/// Temporary project with a fake npm binary.
pub struct TestProject {
    _temp_dir: TempDir, // Keep alive for RAII cleanup
    project_dir: PathBuf,
    npm_path: PathBuf,
    config_path: PathBuf,
}

impl TestProject {
    /// Create the project directory and the fake npm script.
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let project_dir = temp_dir.path().join("project");
        let bin_dir = temp_dir.path().join("bin");
        fs::create_dir_all(project_dir.join("packages").join("core"))?;
        fs::create_dir_all(&bin_dir)?;

        let npm_path = bin_dir.join("npm");
        let script = format!("#!/bin/sh\n{}", SCRIPT_BODY.replace("@LISTING@", LISTING.trim_matches('\n')));
        fs::write(&npm_path, script)
            .with_context(|| format!("Failed to write fake npm to {}", npm_path.display()))?;
        make_executable(&npm_path)?;

        // Never created unless a test writes it, so the user's config is not read.
        let config_path = temp_dir.path().join("config.toml");

        Ok(Self {
            _temp_dir: temp_dir,
            project_dir,
            npm_path,
            config_path,
        })
    }

    /// Get the project directory path
    pub fn project_path(&self) -> &Path {
        &self.project_dir
    }

    /// Get the fake npm binary path
    pub fn npm_path(&self) -> &Path {
        &self.npm_path
    }

    /// Get the config file path handed to the CLI
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Write the global config file
    pub fn write_config(&self, content: &str) -> Result<()> {
        fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write config to {}", self.config_path.display()))
    }

    /// An `npmcall` command running in the project directory against the fake npm.
    pub fn npmcall(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("npmcall").unwrap();
        cmd.current_dir(&self.project_dir)
            .env("NPMCALL_NPM", &self.npm_path)
            .env("NPMCALL_CONFIG", &self.config_path)
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run the fake npm directly, for checking the script itself.
    pub fn run_fake_npm(&self, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.npm_path)
            .args(args)
            .current_dir(&self.project_dir)
            .output()
            .context("Failed to run fake npm")?;
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
