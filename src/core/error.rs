//! Error handling for npmcall
//!
//! The library surfaces a single error kind for anything that goes wrong inside an
//! npm invocation: [`NpmError::CommandExecution`]. Whether npm is missing, the
//! parameters are malformed or the directory does not exist, the external process
//! exits non-zero and the failure collapses into that variant. Two further variants
//! exist for failures that never reach npm at all:
//!
//! - [`NpmError::UnknownCommand`] when dispatching by string names nothing discovered
//! - [`NpmError::Io`] when the shell itself could not be spawned
//!
//! For the command-line front end, [`user_friendly_error`] turns any
//! [`anyhow::Error`] into an [`ErrorContext`] carrying details and a suggestion.
//!
//! # Examples
//!
//! ```rust,no_run
//! use npmcall::core::{NpmError, user_friendly_error};
//!
//! let error = NpmError::from_exit(1, "");
//! assert_eq!(error.to_string(), "Incorrect code #1");
//!
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for npmcall operations
#[derive(Error, Debug)]
pub enum NpmError {
    /// The npm process exited with a non-zero code.
    ///
    /// `message` is the trimmed combined output of the process, or
    /// `Incorrect code #<code>` when the process printed nothing.
    #[error("{message}")]
    CommandExecution {
        /// Exit code reported by the process (`-1` when it was killed)
        code: i32,
        /// Trimmed output or the fallback message
        message: String,
    },

    /// A command name or method identifier was not part of the discovered registry
    #[error("Unknown npm command: {name}")]
    UnknownCommand {
        /// The name that failed to resolve
        name: String,
    },

    /// The execution capability failed before npm could report an exit code
    #[error("Failed to {operation}: {source}")]
    Io {
        /// What was being attempted
        operation: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl NpmError {
    /// Builds a [`NpmError::CommandExecution`] from an exit code and captured output.
    ///
    /// ```rust
    /// use npmcall::core::NpmError;
    ///
    /// assert_eq!(NpmError::from_exit(2, "  bad thing\n").to_string(), "bad thing");
    /// assert_eq!(NpmError::from_exit(1, "").to_string(), "Incorrect code #1");
    /// ```
    #[must_use]
    pub fn from_exit(code: i32, output: &str) -> Self {
        let message = if output.is_empty() {
            format!("Incorrect code #{code}")
        } else {
            output.trim().to_string()
        };
        Self::CommandExecution {
            code,
            message,
        }
    }

    /// Wraps an I/O error raised while driving the external process.
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Exit code of a failed invocation, if this error came from one.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::CommandExecution {
                code,
                ..
            } => Some(*code),
            _ => None,
        }
    }
}

/// Result alias used across the library
pub type Result<T, E = NpmError> = std::result::Result<T, E>;

/// Error wrapper with user-facing details and a suggestion.
///
/// `ErrorContext` does not own a typed error; it keeps the rendered message so it
/// can represent any [`anyhow::Error`] the CLI encounters.
#[derive(Debug)]
pub struct ErrorContext {
    /// The main error message
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context holding only the message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error to stderr: message in red, details in yellow, suggestion in green.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] suitable for terminal display.
///
/// The error chain is searched for an [`NpmError`]; if found, the context gets
/// suggestions specific to that failure. Other errors keep their full context chain
/// as the message.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(npm_error) = error.chain().find_map(|e| e.downcast_ref::<NpmError>()) {
        return create_error_context(npm_error);
    }

    if let Some(ctx) = error.downcast_ref::<ErrorContext>() {
        return ErrorContext {
            message: ctx.message.clone(),
            suggestion: ctx.suggestion.clone(),
            details: ctx.details.clone(),
        };
    }

    ErrorContext::new(format!("{error:#}"))
}

fn create_error_context(error: &NpmError) -> ErrorContext {
    match error {
        NpmError::CommandExecution {
            code: 127,
            ..
        } => ErrorContext::new(error.to_string())
            .with_details("npm exited with code 127, which usually means it was not found")
            .with_suggestion(
                "Install Node.js and npm, or point npmcall at a binary with --npm or NPMCALL_NPM",
            ),
        NpmError::CommandExecution {
            code: -1,
            ..
        } => ErrorContext::new(error.to_string())
            .with_details("npm was terminated before it reported an exit code")
            .with_suggestion("Increase exec.timeout_secs in the config file or remove it"),
        NpmError::CommandExecution {
            code,
            ..
        } => ErrorContext::new(error.to_string())
            .with_details(format!("npm exited with code {code}")),
        NpmError::UnknownCommand {
            ..
        } => ErrorContext::new(error.to_string())
            .with_suggestion("Run 'npmcall commands' to list the commands npm reported"),
        NpmError::Io {
            ..
        } => ErrorContext::new(error.to_string())
            .with_suggestion("Check that a system shell is available and the directory exists"),
    }
}
