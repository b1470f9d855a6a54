//! Error types for the deployment pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Errors detected while resolving settings, before any step runs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No SVN username was configured
    #[error("Username is required.")]
    MissingUsername,

    /// Theme releases copy the previous version, so it must be known
    #[error("earlierVersion is required when repoType is 'theme'.")]
    MissingEarlierVersion,

    /// A field that paths or URLs are derived from was empty
    #[error("{field} must not be empty.")]
    EmptyField {
        /// Name of the empty field.
        field: &'static str,
    },

    /// The repository URL could not be parsed
    #[error("Invalid repository url '{url}': {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },

    /// Unrecognized artifact type
    #[error("Unknown repoType '{0}': expected 'plugin' or 'theme'")]
    UnknownRepoType(String),
}

/// A VCS or filesystem operation that did not succeed.
///
/// These are non-fatal: the step records them as warnings and the run goes on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// The command ran and exited non-zero
    #[error("`{command}` exited with {}: {stderr}", exit_label(*.code))]
    Failed {
        /// Rendered command line.
        command: String,
        /// Exit code, `None` when killed by a signal.
        code: Option<i32>,
        /// Captured standard error.
        stderr: String,
    },

    /// The command could not be started at all
    #[error("Failed to start `{command}`: {reason}")]
    Spawn {
        /// Rendered command line.
        command: String,
        /// OS error message.
        reason: String,
    },

    /// The command's output went past the capture limit, so it cannot be trusted
    #[error("`{command}` output exceeded {limit} bytes and was truncated")]
    Truncated {
        /// Rendered command line.
        command: String,
        /// Capture limit in bytes.
        limit: usize,
    },

    /// The command was killed because the run was cancelled
    #[error("`{command}` was cancelled")]
    Cancelled {
        /// Rendered command line.
        command: String,
    },

    /// A local filesystem primitive failed
    #[error("{operation} '{}' failed: {reason}", .path.display())]
    Filesystem {
        /// Operation that failed (`clear`, `copy`, ...).
        operation: &'static str,
        /// Path the operation targeted.
        path: PathBuf,
        /// OS error message.
        reason: String,
    },
}

fn exit_label(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}

/// A step that cannot hand off to the next one. Halts the run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FatalStepError {
    /// The working directory could not be created
    #[error("Step '{step}' could not create working directory '{}': {reason}", .path.display())]
    WorkDir {
        /// Step that failed.
        step: String,
        /// Directory that could not be created.
        path: PathBuf,
        /// OS error message.
        reason: String,
    },

    /// The run was interrupted
    #[error("Deployment cancelled during step '{step}'")]
    Cancelled {
        /// Step that was running or about to run.
        step: String,
    },
}

impl FatalStepError {
    /// Returns true if this error came from a cancellation request
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
