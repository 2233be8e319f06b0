//! Global constants used throughout npmcall.

/// Executable name looked up on `PATH` when no override is given.
pub const NPM_BINARY_NAME: &str = "npm";

/// Environment variable that overrides the npm binary location.
pub const NPM_PATH_ENV: &str = "NPMCALL_NPM";

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "NPMCALL_CONFIG";

/// Flag that makes npm print its command list.
pub const LIST_COMMANDS_FLAG: &str = "-l";

/// Flags appended to every invocation, after the option-derived ones.
pub const ALWAYS_FLAGS: &str = "--always-auth --no-strict-ssl";

/// Exit code reported when the binary could not be located.
///
/// Matches the code POSIX shells use for "command not found".
pub const NOT_FOUND_EXIT_CODE: i32 = 127;

/// Exit code reported when the working directory does not exist.
pub const MISSING_DIR_EXIT_CODE: i32 = 1;

/// How long a timed-out run waits for its output readers after the kill.
pub const READER_GRACE_MILLIS: u64 = 500;

/// Exit code reported when a process was killed (timeout or signal).
pub const KILLED_EXIT_CODE: i32 = -1;

/// Invocations slower than this are logged at `info` under `npm::perf`.
pub const SLOW_INVOCATION_SECS: u64 = 1;
