//! A command runner that records instead of executing
//!
//! Used for `deploy --dry-run` and as a scripted stand-in for the VCS client
//! in tests. Unmatched commands succeed with empty output.

use super::shell::{CommandLine, CommandOutput, RunOptions};
use super::traits::CommandRunner;
use crate::pipeline::CommandError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;

type Matcher = Box<dyn Fn(&CommandLine) -> bool + Send + Sync>;

/// One command seen by a [`RecordingRunner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// The command as issued
    pub command: CommandLine,
    /// Working directory it was issued in
    pub working_dir: Option<PathBuf>,
}

/// Records every command and answers from a list of scripted responses
#[derive(Default)]
pub struct RecordingRunner {
    responses: Vec<(Matcher, CommandOutput)>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingRunner {
    /// Creates a runner where every command succeeds silently
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers commands whose first argument is `subcommand` with `output`
    #[must_use]
    pub fn respond_to(self, subcommand: &str, output: CommandOutput) -> Self {
        let subcommand = subcommand.to_string();
        self.respond_when(move |cmd| cmd.subcommand() == Some(subcommand.as_str()), output)
    }

    /// Answers commands matching `matcher` with `output`. Earlier rules win.
    #[must_use]
    pub fn respond_when<F>(mut self, matcher: F, output: CommandOutput) -> Self
    where
        F: Fn(&CommandLine) -> bool + Send + Sync + 'static,
    {
        self.responses.push((Box::new(matcher), output));
        self
    }

    /// Returns every recorded call, in order
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the subcommand of every recorded call, in order
    #[must_use]
    pub fn subcommands(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .map(|call| call.command.subcommand().unwrap_or_default().to_string())
            .collect()
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(
        &self,
        command: &CommandLine,
        options: &RunOptions,
    ) -> Result<CommandOutput, CommandError> {
        tracing::info!(command = %command, cwd = ?options.working_dir, "Dry run: would execute");

        self.calls.lock().push(RecordedCall {
            command: command.clone(),
            working_dir: options.working_dir.clone(),
        });

        let output = self
            .responses
            .iter()
            .find(|(matcher, _)| matcher(command))
            .map_or_else(|| CommandOutput::success(""), |(_, output)| output.clone());
        Ok(output)
    }
}

impl std::fmt::Debug for RecordingRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingRunner")
            .field("responses", &self.responses.len())
            .field("calls", &self.calls.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_and_defaults_to_success() {
        let runner = RecordingRunner::new();
        let cmd = CommandLine::new("svn").arg("status");
        let output = runner
            .run(&cmd, &RunOptions::new(10).in_dir("/tmp/demo/trunk"))
            .await
            .unwrap();

        assert!(output.is_success());
        assert_eq!(runner.subcommands(), vec!["status".to_string()]);
        assert_eq!(
            runner.calls()[0].working_dir,
            Some(PathBuf::from("/tmp/demo/trunk"))
        );
    }

    #[tokio::test]
    async fn test_first_matching_response_wins() {
        let runner = RecordingRunner::new()
            .respond_when(
                |cmd| cmd.args.iter().any(|a| a.ends_with("assets/")),
                CommandOutput::failure(1, "path not found"),
            )
            .respond_to("co", CommandOutput::success("Checked out revision 1."));

        let assets = CommandLine::new("svn").args(["co", "https://svn.example.org/demo/assets/"]);
        let trunk = CommandLine::new("svn").args(["co", "https://svn.example.org/demo/trunk/"]);

        let options = RunOptions::new(10);
        assert!(!runner.run(&assets, &options).await.unwrap().is_success());
        assert!(runner.run(&trunk, &options).await.unwrap().is_success());
    }
}
