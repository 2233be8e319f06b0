//! Platform helpers: shell selection, binary lookup and path handling.

use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};

/// Checks if the current platform is Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Returns the shell program and the flag that makes it run a command string.
///
/// - **Windows**: `cmd /C`
/// - **Unix-like**: `sh -c`
///
/// Command lines are executed through the shell so parameter strings keep their
/// quoting and are passed through verbatim.
#[must_use]
pub const fn get_shell_command() -> (&'static str, &'static str) {
    if is_windows() {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    }
}

/// Resolves an executable by name through `PATH` (and `PATHEXT` on Windows).
///
/// Returns `None` instead of an error; a missing binary is only reported once a
/// command is actually executed.
#[must_use]
pub fn find_executable(name: &str) -> Option<PathBuf> {
    match which::which(name) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::debug!(target: "npm", "Could not locate '{}': {}", name, e);
            None
        }
    }
}

/// Resolves a path with tilde expansion and environment variable substitution.
///
/// ```rust,no_run
/// use npmcall::utils::platform::resolve_path;
///
/// # fn example() -> anyhow::Result<()> {
/// let project = resolve_path("~/projects/app")?;
/// println!("{}", project.display());
/// # Ok(())
/// # }
/// ```
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Failed to expand path: {path}"))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Normalizes a path by resolving `.` and `..` components lexically.
///
/// The filesystem is never consulted, so symlinks are not resolved and the path
/// does not need to exist. A `..` at the root stays at the root.
#[must_use]
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }

    if components.is_empty() {
        return PathBuf::from(".");
    }

    components.iter().collect()
}

/// Joins `path` onto `base` and normalizes the result.
///
/// Absolute `path` values replace `base`, as [`Path::join`] does.
#[must_use]
pub fn join_normalized(base: &Path, path: impl AsRef<Path>) -> PathBuf {
    normalize_path(&base.join(path))
}
