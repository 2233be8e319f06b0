//! Core types for npmcall
//!
//! Currently this is the error layer: [`NpmError`] for library callers and
//! [`ErrorContext`] / [`user_friendly_error`] for the command-line front end.

pub mod error;

pub use error::{ErrorContext, NpmError, Result, user_friendly_error};
