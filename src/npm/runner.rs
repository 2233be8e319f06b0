//! Process execution for composed npm command lines.
//!
//! [`CommandRunner`] is the seam between the proxy and the operating system: it
//! takes a fully composed command line plus the directory to run it in, and
//! returns the exit code with the combined output. [`ShellRunner`] is the real
//! implementation; tests substitute a scripted runner.
//!
//! The working directory travels with every [`Invocation`]. Nothing here touches
//! the process-wide current directory, so concurrent invocations from different
//! [`Npm`](super::Npm) instances cannot run in each other's directories.

use futures::future::BoxFuture;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::constants::{KILLED_EXIT_CODE, MISSING_DIR_EXIT_CODE, READER_GRACE_MILLIS};
use crate::utils::platform::get_shell_command;

/// Everything a runner needs to execute one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The full command line, handed to the shell verbatim
    pub line: String,
    /// Directory the process runs in
    pub dir: PathBuf,
    /// Keep the process output off the console
    pub silent: bool,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
    /// Kill the process after this long
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// A silent invocation with no extra environment and no timeout.
    pub fn new(line: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            line: line.into(),
            dir: dir.into(),
            silent: true,
            env: Vec::new(),
            timeout: None,
        }
    }
}

/// Exit code and combined output of one process run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Process exit code (`-1` when killed)
    pub exit_code: i32,
    /// Captured stdout followed by captured stderr
    pub output: String,
}

impl ExecutionResult {
    /// Build a result from its parts.
    pub fn new(exit_code: i32, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
        }
    }

    /// `true` when the exit code is zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Whatever was read before the kill, followed by the timeout notice.
    fn timed_out(after: Duration, partial: &str) -> Self {
        let mut output = partial.to_string();
        if !output.is_empty() && !output.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&format!("Command timed out after {} seconds", after.as_secs()));
        Self::new(KILLED_EXIT_CODE, output)
    }

    fn from_parts(status: std::process::ExitStatus, stdout: &[u8], stderr: &[u8]) -> Self {
        let mut output = String::from_utf8_lossy(stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(stderr));
        Self::new(status.code().unwrap_or(KILLED_EXIT_CODE), output)
    }
}

/// Runs composed command lines, blocking or asynchronously.
///
/// Implementations must be object safe so an [`Npm`](super::Npm) can hold any
/// runner behind an `Arc<dyn CommandRunner>`.
pub trait CommandRunner: Send + Sync {
    /// Run to completion, blocking the calling thread.
    fn run_blocking(&self, invocation: &Invocation) -> io::Result<ExecutionResult>;

    /// Run to completion without blocking the calling thread.
    fn run<'a>(&'a self, invocation: &'a Invocation) -> BoxFuture<'a, io::Result<ExecutionResult>>;
}

/// Executes command lines through the system shell (`sh -c` / `cmd /C`).
///
/// When an invocation is not silent, output is echoed to this process's stdout and
/// stderr as it arrives, in addition to being captured.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    /// Creates the shell runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl CommandRunner for ShellRunner {
    fn run_blocking(&self, invocation: &Invocation) -> io::Result<ExecutionResult> {
        let (shell, flag) = get_shell_command();
        let mut cmd = std::process::Command::new(shell);
        cmd.arg(flag)
            .arg(&invocation.line)
            .current_dir(&invocation.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &invocation.env {
            tracing::trace!(target: "npm", "Setting env var: {}", key);
            cmd.env(key, value);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return spawn_failure(invocation, e),
        };
        let stdout = child.stdout.take().ok_or_else(|| io::Error::other("Failed to capture stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| io::Error::other("Failed to capture stderr"))?;

        let echo = !invocation.silent;
        let stdout_buf = Captured::default();
        let stderr_buf = Captured::default();
        let stdout_thread = {
            let captured = Arc::clone(&stdout_buf);
            thread::spawn(move || tee_blocking(stdout, echo.then(io::stdout), &captured))
        };
        let stderr_thread = {
            let captured = Arc::clone(&stderr_buf);
            thread::spawn(move || tee_blocking(stderr, echo.then(io::stderr), &captured))
        };

        let status = match invocation.timeout {
            None => child.wait()?,
            Some(limit) => {
                let start = Instant::now();
                loop {
                    if let Some(status) = child.try_wait()? {
                        break status;
                    }
                    if start.elapsed() > limit {
                        tracing::warn!(
                            target: "npm",
                            "Command timed out after {} seconds: {}",
                            limit.as_secs(),
                            invocation.line
                        );
                        let _ = child.kill();
                        let _ = child.wait();

                        // A grandchild may still hold the pipes. Its readers are not
                        // joined past the grace period and exit once it does.
                        let deadline = Instant::now() + Duration::from_millis(READER_GRACE_MILLIS);
                        while !(stdout_thread.is_finished() && stderr_thread.is_finished())
                            && Instant::now() < deadline
                        {
                            thread::sleep(Duration::from_millis(10));
                        }
                        return Ok(ExecutionResult::timed_out(
                            limit,
                            &partial_output(&stdout_buf, &stderr_buf),
                        ));
                    }
                    thread::sleep(Duration::from_millis(50));
                }
            }
        };

        let _ = stdout_thread.join();
        let _ = stderr_thread.join();

        Ok(ExecutionResult::from_parts(status, &snapshot(&stdout_buf), &snapshot(&stderr_buf)))
    }

    fn run<'a>(&'a self, invocation: &'a Invocation) -> BoxFuture<'a, io::Result<ExecutionResult>> {
        Box::pin(async move {
            let (shell, flag) = get_shell_command();
            let mut cmd = tokio::process::Command::new(shell);
            cmd.arg(flag)
                .arg(&invocation.line)
                .current_dir(&invocation.dir)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true);
            for (key, value) in &invocation.env {
                tracing::trace!(target: "npm", "Setting env var: {}", key);
                cmd.env(key, value);
            }

            let mut child = match cmd.spawn() {
                Ok(child) => child,
                Err(e) => return spawn_failure(invocation, e),
            };
            let stdout =
                child.stdout.take().ok_or_else(|| io::Error::other("Failed to capture stdout"))?;
            let stderr =
                child.stderr.take().ok_or_else(|| io::Error::other("Failed to capture stderr"))?;

            let echo = !invocation.silent;
            let stdout_buf = Captured::default();
            let stderr_buf = Captured::default();
            let mut stdout_task = tokio::spawn(tee_async(
                stdout,
                echo.then(tokio::io::stdout),
                Arc::clone(&stdout_buf),
            ));
            let mut stderr_task = tokio::spawn(tee_async(
                stderr,
                echo.then(tokio::io::stderr),
                Arc::clone(&stderr_buf),
            ));

            let status = match invocation.timeout {
                None => child.wait().await?,
                Some(limit) => {
                    if let Ok(status) = tokio::time::timeout(limit, child.wait()).await {
                        status?
                    } else {
                        tracing::warn!(
                            target: "npm",
                            "Command timed out after {} seconds: {}",
                            limit.as_secs(),
                            invocation.line
                        );
                        let _ = child.kill().await;
                        let grace = Duration::from_millis(READER_GRACE_MILLIS);
                        let _ = tokio::time::timeout(grace, async {
                            let _ = (&mut stdout_task).await;
                            let _ = (&mut stderr_task).await;
                        })
                        .await;
                        stdout_task.abort();
                        stderr_task.abort();
                        return Ok(ExecutionResult::timed_out(
                            limit,
                            &partial_output(&stdout_buf, &stderr_buf),
                        ));
                    }
                }
            };

            stdout_task.await.map_err(io::Error::other)?;
            stderr_task.await.map_err(io::Error::other)?;

            Ok(ExecutionResult::from_parts(status, &snapshot(&stdout_buf), &snapshot(&stderr_buf)))
        })
    }
}

/// A spawn that failed because the working directory is missing is reported as a
/// failed run; any other spawn error is returned unchanged.
fn spawn_failure(invocation: &Invocation, error: io::Error) -> io::Result<ExecutionResult> {
    if invocation.dir.is_dir() {
        return Err(error);
    }

    tracing::debug!(
        target: "npm",
        "Working directory {} does not exist: {}",
        invocation.dir.display(),
        error
    );
    Ok(ExecutionResult::new(
        MISSING_DIR_EXIT_CODE,
        format!("Cannot run in {}: {}", invocation.dir.display(), error),
    ))
}

/// Bytes read from one output stream so far, shared with its reader.
type Captured = Arc<Mutex<Vec<u8>>>;

fn snapshot(captured: &Mutex<Vec<u8>>) -> Vec<u8> {
    captured.lock().map(|bytes| bytes.clone()).unwrap_or_default()
}

fn partial_output(stdout: &Mutex<Vec<u8>>, stderr: &Mutex<Vec<u8>>) -> String {
    let mut bytes = snapshot(stdout);
    bytes.extend(snapshot(stderr));
    String::from_utf8_lossy(&bytes).into_owned()
}

fn append(captured: &Mutex<Vec<u8>>, chunk: &[u8]) {
    if let Ok(mut bytes) = captured.lock() {
        bytes.extend_from_slice(chunk);
    }
}

/// Reads `reader` to the end into `captured`, copying every chunk into `sink`
/// when one is given.
fn tee_blocking<R: Read, W: Write>(mut reader: R, mut sink: Option<W>, captured: &Mutex<Vec<u8>>) {
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                append(captured, &buf[..n]);
                if let Some(sink) = sink.as_mut() {
                    let _ = sink.write_all(&buf[..n]);
                    let _ = sink.flush();
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(_) => break,
        }
    }
}

async fn tee_async<R, W>(mut reader: R, mut sink: Option<W>, captured: Captured)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                append(&captured, &buf[..n]);
                if let Some(sink) = sink.as_mut() {
                    let _ = sink.write_all(&buf[..n]).await;
                    let _ = sink.flush().await;
                }
            }
        }
    }
}
