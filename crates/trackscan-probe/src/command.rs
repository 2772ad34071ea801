//! Builder for executing external tool commands with timeout support.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// Ways a tool invocation can fail.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to spawn: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("exited with status {status}: {}", .stderr.trim())]
    Failed {
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },

    #[error("I/O error waiting for process: {0}")]
    Wait(#[source] std::io::Error),
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use trackscan_probe::ToolCommand;
/// use std::path::PathBuf;
///
/// # async fn example() -> Result<(), trackscan_probe::CommandError> {
/// let output = ToolCommand::new(PathBuf::from("mkvmerge"))
///     .arg("-J")
///     .arg("/path/to/video.mkv")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// The child is killed when the timeout elapses.
    ///
    /// # Errors
    ///
    /// - [`CommandError::Spawn`] if the process cannot be started.
    /// - [`CommandError::Timeout`] if it runs longer than the timeout.
    /// - [`CommandError::Failed`] on a non-zero exit status (carries stderr).
    pub async fn execute(&self) -> Result<ToolOutput, CommandError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::trace!(program = %self.program.display(), args = ?self.args, "spawning tool");

        let child = cmd.spawn().map_err(CommandError::Spawn)?;

        // Dropping the timed-out future drops the child, which kills it.
        let result = tokio::time::timeout(self.timeout, child.wait_with_output()).await;

        match result {
            Ok(Ok(output)) => {
                let tool_output = ToolOutput {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };

                if !output.status.success() {
                    return Err(CommandError::Failed {
                        status: tool_output.status,
                        stdout: tool_output.stdout,
                        stderr: tool_output.stderr,
                    });
                }

                Ok(tool_output)
            }
            Ok(Err(e)) => Err(CommandError::Wait(e)),
            Err(_elapsed) => Err(CommandError::Timeout(self.timeout)),
        }
    }
}
