//! Capability traits the steps run against
//!
//! Steps never spawn processes or touch the disk directly; they go through a
//! [`CommandRunner`] and a [`FileSystem`] bundled in a [`StepEnv`]. Real runs
//! use [`TokioCommandRunner`](super::TokioCommandRunner) and
//! [`LocalFs`](super::LocalFs); dry runs and tests swap in recording doubles.

use super::shell::{CommandLine, CommandOutput, RunOptions};
use crate::pipeline::CommandError;
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Runs one external command and waits for it
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command`.
    ///
    /// A non-zero exit is an `Ok` result with a failing status; `Err` is
    /// reserved for commands that could not be started or were cancelled.
    async fn run(
        &self,
        command: &CommandLine,
        options: &RunOptions,
    ) -> Result<CommandOutput, CommandError>;
}

/// Recursive directory primitives used by the reset and copy steps
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Removes everything inside `dir` except VCS metadata. Absent `dir` is a no-op.
    async fn clear_dir(&self, dir: &Path) -> io::Result<()>;

    /// Removes `dir` and everything below it. Absent `dir` is a no-op.
    async fn remove_dir(&self, dir: &Path) -> io::Result<()>;

    /// Copies the tree under `src` into `dest`, creating `dest` and
    /// overwriting existing files. Files only present in `dest` are kept.
    async fn copy_dir(&self, src: &Path, dest: &Path) -> io::Result<()>;

    /// Creates `dir` and its parents if missing
    async fn ensure_dir(&self, dir: &Path) -> io::Result<()>;
}

/// The capabilities handed to every step
#[derive(Clone)]
pub struct StepEnv {
    /// External command runner
    pub runner: Arc<dyn CommandRunner>,
    /// Filesystem primitives
    pub fs: Arc<dyn FileSystem>,
}

impl StepEnv {
    /// Bundles a runner and a filesystem
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, fs: Arc<dyn FileSystem>) -> Self {
        Self { runner, fs }
    }
}

impl std::fmt::Debug for StepEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepEnv").finish_non_exhaustive()
    }
}
