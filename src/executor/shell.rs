//! External command execution
//!
//! Commands are structured argument vectors ([`CommandLine`]), never shell
//! strings, so paths and commit messages need no quoting. Output is drained
//! concurrently and each stream is capped at [`RunOptions::max_output_bytes`];
//! bytes past the cap are read and dropped so the child never blocks on a
//! full pipe.

use super::cancel::CancelSignal;
use super::traits::CommandRunner;
use crate::pipeline::CommandError;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    /// Executable name or path
    pub program: String,
    /// Arguments, passed verbatim
    pub args: Vec<String>,
}

impl CommandLine {
    /// Creates a command with no arguments
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Returns the first argument, the subcommand for tools like `svn`
    #[must_use]
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words = std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str));
        f.write_str(&shell_words::join(words))
    }
}

/// Per-invocation options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Working directory; the process's own when `None`
    pub working_dir: Option<PathBuf>,
    /// Cap on captured bytes, per stream
    pub max_output_bytes: usize,
}

impl RunOptions {
    /// Creates options with the given output cap and no working directory
    #[must_use]
    pub fn new(max_output_bytes: usize) -> Self {
        Self {
            working_dir: None,
            max_output_bytes,
        }
    }

    /// Sets the working directory
    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,
    /// Standard output, lossily decoded
    pub stdout: String,
    /// Standard error, lossily decoded
    pub stderr: String,
    /// True if either stream exceeded the output cap
    pub truncated: bool,
    /// Wall time of the command
    pub duration: Duration,
}

impl CommandOutput {
    /// A successful result with the given stdout
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
            truncated: false,
            duration: Duration::ZERO,
        }
    }

    /// A failed result with the given exit code and stderr
    #[must_use]
    pub fn failure(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
            truncated: false,
            duration: Duration::ZERO,
        }
    }

    /// Returns true if the command exited with status 0
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Converts a non-zero exit into a [`CommandError`]
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Failed`] when the command did not succeed.
    pub fn check(self, command: &CommandLine) -> Result<Self, CommandError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(CommandError::Failed {
                command: command.to_string(),
                code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs commands as child processes on the tokio runtime
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner {
    cancel: CancelSignal,
}

impl TokioCommandRunner {
    /// Creates a runner that kills its child when `cancel` fires
    #[must_use]
    pub fn new(cancel: CancelSignal) -> Self {
        Self { cancel }
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(
        &self,
        command: &CommandLine,
        options: &RunOptions,
    ) -> Result<CommandOutput, CommandError> {
        let rendered = command.to_string();
        if self.cancel.is_cancelled() {
            return Err(CommandError::Cancelled { command: rendered });
        }

        tracing::debug!(command = %rendered, cwd = ?options.working_dir, "Executing command");

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            // The VCS client prompts for credentials on the terminal.
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &options.working_dir {
            cmd.current_dir(dir);
        }

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| CommandError::Spawn {
            command: rendered.clone(),
            reason: e.to_string(),
        })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let limit = options.max_output_bytes;

        let finished = tokio::select! {
            outcome = async {
                let ((out, out_cut), (err, err_cut)) =
                    tokio::join!(read_capped(stdout, limit), read_capped(stderr, limit));
                let status = child.wait().await;
                (status, out, err, out_cut || err_cut)
            } => Some(outcome),
            () = self.cancel.cancelled() => None,
        };

        let Some((status, stdout, stderr, truncated)) = finished else {
            tracing::warn!(command = %rendered, "Killing command after cancellation");
            if let Err(e) = child.kill().await {
                tracing::warn!(command = %rendered, error = %e, "Failed to kill command");
            }
            return Err(CommandError::Cancelled { command: rendered });
        };

        let status = status.map_err(|e| CommandError::Spawn {
            command: rendered.clone(),
            reason: e.to_string(),
        })?;

        if truncated {
            tracing::warn!(
                command = %rendered,
                max_output_bytes = limit,
                "Command output exceeded the capture limit and was truncated"
            );
        }

        Ok(CommandOutput {
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            truncated,
            duration: start.elapsed(),
        })
    }
}

/// Reads a stream to the end, keeping at most `limit` bytes.
///
/// Returns the kept bytes and whether anything was dropped.
pub(crate) async fn read_capped<R>(reader: Option<R>, limit: usize) -> (Vec<u8>, bool)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return (Vec::new(), false);
    };

    let mut kept = Vec::new();
    let mut truncated = false;
    let mut chunk = [0u8; 8192];

    loop {
        match reader.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = limit.saturating_sub(kept.len());
                if n > room {
                    truncated = true;
                }
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }

    (kept, truncated)
}
