//! Step sequencer
//!
//! Runs a [`StepPlan`] strictly in order, one step at a time, against a
//! single [`PipelineContext`]. A step that returns a fatal error stops the
//! run; everything else is carried in the context as warnings.

use super::cancel::CancelSignal;
use super::traits::StepEnv;
use crate::pipeline::{FatalStepError, PipelineContext, RunReport, RunStatus, StepPlan};
use std::time::Instant;
use tracing::Instrument;

/// Runs step plans
#[derive(Debug, Clone)]
pub struct Sequencer {
    env: StepEnv,
    cancel: CancelSignal,
}

impl Sequencer {
    /// Creates a sequencer that stops between steps once `cancel` fires
    #[must_use]
    pub fn new(env: StepEnv, cancel: CancelSignal) -> Self {
        Self { env, cancel }
    }

    /// Runs every step of `plan` in order
    pub async fn run(&self, plan: &StepPlan, ctx: PipelineContext) -> RunReport {
        let span = tracing::info_span!(
            "deploy",
            run_id = %ctx.run_id,
            slug = %ctx.settings().slug
        );
        self.run_steps(plan, ctx).instrument(span).await
    }

    async fn run_steps(&self, plan: &StepPlan, mut ctx: PipelineContext) -> RunReport {
        let start = Instant::now();
        tracing::info!(
            steps_count = plan.len(),
            repo_type = %ctx.settings().repo_type,
            "Starting deployment"
        );

        for step in plan {
            if self.cancel.is_cancelled() {
                tracing::warn!(step = %step.name, "Cancelled before step");
                let error = FatalStepError::Cancelled {
                    step: step.name.clone(),
                };
                return ctx.finish(
                    RunStatus::Cancelled,
                    plan.len(),
                    Some(error),
                    start.elapsed(),
                );
            }

            let step_start = Instant::now();
            let span = tracing::info_span!("step", name = %step.name);
            let result = step.execute(&mut ctx, &self.env).instrument(span).await;

            match result {
                Ok(()) => {
                    ctx.complete_step();
                    tracing::debug!(
                        step = %step.name,
                        duration_ms = step_start.elapsed().as_millis(),
                        "Step completed"
                    );
                }
                Err(error) => {
                    let status = if error.is_cancellation() {
                        RunStatus::Cancelled
                    } else {
                        RunStatus::Failed
                    };
                    tracing::error!(step = %step.name, error = %error, "Step failed, stopping deployment");
                    return ctx.finish(status, plan.len(), Some(error), start.elapsed());
                }
            }
        }

        let report = ctx.finish(RunStatus::Succeeded, plan.len(), None, start.elapsed());
        tracing::info!(
            warnings = report.warnings.len(),
            duration_ms = report.duration.as_millis(),
            "Deployment finished"
        );
        report
    }
}
