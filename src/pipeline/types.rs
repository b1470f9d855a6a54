//! Core types for a deployment run
//!
//! [`PipelineContext`] is threaded through every step; [`RunReport`] is what
//! the sequencer hands back when the run ends.

#![allow(clippy::must_use_candidate)]

use super::errors::{CommandError, FatalStepError};
use super::settings::EffectiveSettings;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// A non-fatal failure recorded by a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepWarning {
    /// Name of the step that recorded it
    pub step: String,
    /// What went wrong
    pub error: CommandError,
}

impl fmt::Display for StepWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.step, self.error)
    }
}

/// State shared by the steps of one run
#[derive(Debug, Clone)]
pub struct PipelineContext {
    /// Unique run ID, attached to every log line of the run
    pub run_id: Uuid,
    settings: Arc<EffectiveSettings>,
    warnings: Vec<StepWarning>,
    steps_completed: usize,
}

impl PipelineContext {
    /// Creates the context for a new run
    pub fn new(settings: Arc<EffectiveSettings>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            settings,
            warnings: Vec::new(),
            steps_completed: 0,
        }
    }

    /// The run's settings
    pub fn settings(&self) -> &EffectiveSettings {
        &self.settings
    }

    /// A shared handle to the run's settings
    pub fn shared_settings(&self) -> Arc<EffectiveSettings> {
        Arc::clone(&self.settings)
    }

    /// Records a non-fatal failure
    pub fn warn(&mut self, step: impl Into<String>, error: CommandError) {
        self.warnings.push(StepWarning {
            step: step.into(),
            error,
        });
    }

    /// Warnings recorded so far
    pub fn warnings(&self) -> &[StepWarning] {
        &self.warnings
    }

    /// Marks one more step as finished
    pub fn complete_step(&mut self) {
        self.steps_completed += 1;
    }

    /// Number of steps finished so far
    pub fn steps_completed(&self) -> usize {
        self.steps_completed
    }

    /// Consumes the context into the final report
    pub fn finish(
        self,
        status: RunStatus,
        steps_total: usize,
        error: Option<FatalStepError>,
        duration: Duration,
    ) -> RunReport {
        RunReport {
            run_id: self.run_id,
            status,
            steps_total,
            steps_completed: self.steps_completed,
            warnings: self.warnings,
            error,
            duration,
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Every step ran; warnings may still have been recorded
    Succeeded,
    /// A step reported a fatal error
    Failed,
    /// The run was interrupted
    Cancelled,
}

impl RunStatus {
    /// Returns true if the run went through every step
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILURE"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Outcome of a run
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Run ID from the context
    pub run_id: Uuid,
    /// Final status
    pub status: RunStatus,
    /// Steps in the plan
    pub steps_total: usize,
    /// Steps that finished
    pub steps_completed: usize,
    /// Non-fatal failures, in the order they happened
    pub warnings: Vec<StepWarning>,
    /// The fatal error, when the run did not succeed
    pub error: Option<FatalStepError>,
    /// Wall time of the run
    pub duration: Duration,
}

impl RunReport {
    /// Returns true if every step ran
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if any step recorded a warning
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Returns true if every step ran and none recorded a warning
    pub fn is_clean(&self) -> bool {
        self.is_success() && !self.has_warnings()
    }
}

#[cfg(test)]
#[path = "types_tests.rs"]
mod types_tests;
