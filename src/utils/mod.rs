//! Cross-platform utilities.

pub mod platform;

pub use platform::{find_executable, normalize_path, resolve_path};
