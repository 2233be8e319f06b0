//! Test utilities for npmcall
//!
//! Available to unit tests and, through the `test-utils` feature, to the
//! integration suites.
//!
//! - [`FakeRunner`]: a [`CommandRunner`] that records every invocation and answers
//!   with scripted [`ExecutionResult`]s, so the proxy can be exercised without npm
//! - [`init_test_logging`]: once-only `tracing` setup for tests

use futures::future::BoxFuture;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, Once};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::NpmOptions;
use crate::npm::Npm;
use crate::npm::discovery::Discovery;
use crate::npm::runner::{CommandRunner, ExecutionResult, Invocation};

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` if given, otherwise `RUST_LOG`; without either, nothing is logged.
///
/// ```bash
/// RUST_LOG=npm=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Scripted runner that records invocations.
///
/// Results are handed out in the order they were queued; once the queue is empty
/// every invocation succeeds with empty output. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
    results: Arc<Mutex<VecDeque<ExecutionResult>>>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeRunner {
    /// Creates a runner with no scripted results.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the result for the next unanswered invocation.
    #[must_use]
    pub fn with_result(self, exit_code: i32, output: &str) -> Self {
        self.push_result(exit_code, output);
        self
    }

    /// Queues a result on a shared runner.
    pub fn push_result(&self, exit_code: i32, output: &str) {
        self.results.lock().unwrap().push_back(ExecutionResult::new(exit_code, output));
    }

    /// Every invocation seen so far, in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// The command line of the most recent invocation.
    #[must_use]
    pub fn last_line(&self) -> Option<String> {
        self.invocations.lock().unwrap().last().map(|i| i.line.clone())
    }

    fn answer(&self, invocation: &Invocation) -> ExecutionResult {
        self.invocations.lock().unwrap().push(invocation.clone());
        self.results.lock().unwrap().pop_front().unwrap_or_default()
    }
}

impl CommandRunner for FakeRunner {
    fn run_blocking(&self, invocation: &Invocation) -> io::Result<ExecutionResult> {
        Ok(self.answer(invocation))
    }

    fn run<'a>(&'a self, invocation: &'a Invocation) -> BoxFuture<'a, io::Result<ExecutionResult>> {
        let result = self.answer(invocation);
        Box::pin(async move { Ok(result) })
    }
}

/// Builds an [`Npm`] over `runner` with `/usr/bin/npm` and the given commands.
pub fn fake_npm(dir: &str, options: NpmOptions, commands: &[&str], runner: &FakeRunner) -> Npm {
    let listing: String = commands.iter().map(|c| format!("    {c}\n")).collect();
    let discovery = Discovery::from_listing(Some("/usr/bin/npm".into()), &listing);
    Npm::with_parts(dir, options, Arc::new(discovery), Arc::new(runner.clone()))
}
