//! Step plan selection
//!
//! [`build`] turns effective settings into the ordered list of steps for one
//! run. Plugins get the trunk/tag/assets sequences their flags enable; themes
//! always get the full version-directory sequence.

use super::settings::{EffectiveSettings, RepoType};
use super::steps::{self, ASSETS, Step, TRUNK};
use serde::Serialize;
use std::fmt;

/// Ordered steps for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StepPlan {
    steps: Vec<Step>,
}

impl StepPlan {
    /// Wraps an explicit list of steps
    #[must_use]
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Steps in execution order
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the plan does nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Iterates the steps in order
    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }

    /// Step names in order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }
}

impl<'a> IntoIterator for &'a StepPlan {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for StepPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            writeln!(f, "{:>2}. {step}", i + 1)?;
        }
        Ok(())
    }
}

/// Builds the step plan for `settings`
#[must_use]
pub fn build(settings: &EffectiveSettings) -> StepPlan {
    let steps = match settings.repo_type {
        RepoType::Plugin => plugin_steps(settings),
        RepoType::Theme => theme_steps(settings),
    };
    StepPlan::new(steps)
}

fn plugin_steps(settings: &EffectiveSettings) -> Vec<Step> {
    let mut selected = Vec::new();

    if settings.deploy_trunk {
        selected.extend([
            steps::checkout_dir(TRUNK),
            steps::clear_trunk(),
            steps::copy_build(settings),
            steps::add_files(TRUNK),
            steps::commit_to_trunk(settings),
        ]);
    }

    if settings.deploy_tag {
        selected.push(steps::commit_tag(settings));
    }

    if settings.deploy_assets {
        selected.extend([
            steps::checkout_dir(ASSETS),
            steps::clear_assets(),
            steps::copy_assets(settings),
            steps::add_assets(),
            steps::commit_to_assets(),
        ]);
    }

    selected
}

fn theme_steps(settings: &EffectiveSettings) -> Vec<Step> {
    vec![
        steps::prepare_work_dir(),
        steps::checkout_theme(),
        steps::create_theme_tag(settings),
        steps::clear_theme(settings),
        steps::copy_theme(settings),
        steps::add_theme_files(settings),
        steps::commit_theme(settings),
    ]
}
