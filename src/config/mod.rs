//! Configuration for npmcall.
//!
//! - [`NpmOptions`]: per-instance default flags and runner settings
//! - [`GlobalConfig`]: the TOML file (`~/.npmcall/config.toml`) holding default options

pub mod global;
pub mod options;

pub use global::GlobalConfig;
pub use options::{ExecSettings, NpmOptions, ResolvedExec, UserconfigStyle};
