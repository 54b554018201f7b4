//! SafeCommandExecutor: Type-safe command execution with injection prevention
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only pre-approved programs can execute
//! - **Injection prevention**: Uses `tokio::process::Command`, never a shell
//! - **Argument sanitization**: Arguments passed as a vector, never interpolated into shell strings
//! - **Working directory validation**: Validates existence before execution
//! - **Timeout control**: Kills long-running or hanging processes
//!
//! # Example
//!
//! ```rust,no_run
//! use npm_bulk::SafeCommandExecutor;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), npm_bulk::CommandError> {
//! let mut executor = SafeCommandExecutor::new(std::env::temp_dir())?;
//! executor.set_timeout(Duration::from_secs(30));
//!
//! let output = executor.execute("npm", &["--version"]).await?;
//! println!("{}", String::from_utf8_lossy(&output.stdout));
//! # Ok(())
//! # }
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Allowed programs whitelist for security.
///
/// Matched against the file stem, so `/opt/node/bin/npm` is accepted as well.
const ALLOWED_COMMANDS: &[&str] = &["npm"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command execution failed (e.g., binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Command exceeded the timeout duration
    #[error("Command timeout after {0:?}")]
    Timeout(Duration),
}

/// Safe command executor with security controls
#[derive(Debug)]
pub struct SafeCommandExecutor {
    /// Working directory where commands will be executed
    working_dir: PathBuf,
    /// Optional timeout for command execution
    timeout: Option<Duration>,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.is_dir() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self {
            working_dir,
            timeout: None,
        })
    }

    /// Set command execution timeout.
    ///
    /// Commands exceeding this duration are killed.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    /// Check a program against the whitelist
    pub fn is_allowed(command: &str) -> bool {
        Path::new(command)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| ALLOWED_COMMANDS.contains(&stem))
    }

    /// Execute a command with whitelist validation and argument sanitization.
    ///
    /// Stdout and stderr are captured; stdin is closed so the child can never
    /// block on a prompt.
    ///
    /// # Errors
    ///
    /// - `CommandError::CommandNotAllowed` - Command not in whitelist
    /// - `CommandError::ExecutionFailed` - Binary not found or execution error
    /// - `CommandError::Timeout` - The child was killed after the timeout elapsed
    pub async fn execute<S: AsRef<OsStr>>(
        &self,
        command: &str,
        args: &[S],
    ) -> Result<Output, CommandError> {
        if !Self::is_allowed(command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }

        // npm is a .cmd shim on Windows, not an .exe
        #[cfg(target_os = "windows")]
        let command_name = if command == "npm" {
            format!("{}.cmd", command)
        } else {
            command.to_string()
        };

        #[cfg(not(target_os = "windows"))]
        let command_name = command.to_string();

        let mut child = Command::new(&command_name);
        child
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, child.output())
                .await
                .map_err(|_| CommandError::Timeout(limit))?,
            None => child.output().await,
        };

        output.map_err(|e| CommandError::ExecutionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_whitelist_matches_file_stem() {
        assert!(SafeCommandExecutor::is_allowed("npm"));
        assert!(SafeCommandExecutor::is_allowed("/usr/local/bin/npm"));
        assert!(SafeCommandExecutor::is_allowed("npm.cmd"));
        assert!(!SafeCommandExecutor::is_allowed("sh"));
        assert!(!SafeCommandExecutor::is_allowed("/bin/npmx"));
        assert!(!SafeCommandExecutor::is_allowed(""));
    }

    #[tokio::test]
    async fn test_rejected_command_rm() {
        let executor = SafeCommandExecutor::new(std::env::temp_dir()).unwrap();
        let result = executor.execute("rm", &["-rf", "/"]).await;
        assert!(
            matches!(result, Err(CommandError::CommandNotAllowed(_))),
            "rm should be rejected as not in whitelist"
        );
    }

    #[test]
    fn test_invalid_working_directory() {
        let result = SafeCommandExecutor::new("/nonexistent/directory/that/does/not/exist");
        assert!(
            matches!(result, Err(CommandError::InvalidWorkingDirectory(_))),
            "Should reject non-existent working directory"
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_execution_failure() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("npm");
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();

        let result = executor
            .execute(missing.to_str().unwrap(), &["--version"])
            .await;
        assert!(matches!(result, Err(CommandError::ExecutionFailed(_))));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use crate::test_support::write_fake_npm;

        #[tokio::test]
        async fn test_output_capture_and_working_dir() {
            let temp_dir = TempDir::new().unwrap();
            let npm = write_fake_npm(temp_dir.path(), "pwd\necho \"args:$*\" >&2\nexit 3\n");
            let workdir = TempDir::new().unwrap();
            let executor = SafeCommandExecutor::new(workdir.path()).unwrap();

            let output = executor
                .execute(npm.to_str().unwrap(), &["pack", "a b; rm -rf /"])
                .await
                .unwrap();

            assert_eq!(output.status.code(), Some(3));
            let stdout = String::from_utf8_lossy(&output.stdout);
            let expected_dir = workdir.path().canonicalize().unwrap();
            assert_eq!(
                std::path::Path::new(stdout.trim()).canonicalize().unwrap(),
                expected_dir
            );
            let stderr = String::from_utf8_lossy(&output.stderr);
            assert_eq!(stderr.trim(), "args:pack a b; rm -rf /");
        }

        #[tokio::test]
        async fn test_command_with_timeout() {
            let temp_dir = TempDir::new().unwrap();
            let npm = write_fake_npm(temp_dir.path(), "sleep 5\n");
            let mut executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
            executor.set_timeout(Duration::from_millis(200));

            let result = executor.execute::<&str>(npm.to_str().unwrap(), &[]).await;
            assert!(matches!(result, Err(CommandError::Timeout(_))));
        }
    }
}
