//! Deployment steps
//!
//! A [`Step`] is a named unit of work run against the shared
//! [`PipelineContext`]. The constructors in this module make up the step
//! library; [`plan::build`](super::plan::build) picks and orders them.
//!
//! Failure policy: a command or filesystem failure is logged and recorded as
//! a warning on the context, and the run moves on. Only a step that cannot
//! hand off to the next one (the working directory cannot be created, or the
//! run was cancelled) returns [`FatalStepError`].

#![allow(clippy::must_use_candidate)]

use super::errors::{CommandError, FatalStepError};
use super::settings::EffectiveSettings;
use super::types::PipelineContext;
use crate::executor::{CommandLine, CommandOutput, RunOptions, StepEnv};
use crate::infrastructure::svn::{SvnClient, parse_status};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Repository directory holding the current release
pub const TRUNK: &str = "trunk";
/// Repository directory holding the plugin directory assets
pub const ASSETS: &str = "assets";
/// Repository directory holding tagged releases
pub const TAGS: &str = "tags";

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StepType {
    /// Check out `<url><dir>/` into `<workDir><dir>`
    Checkout {
        /// Repository directory
        dir: String,
    },

    /// Check out the whole repository into `<workDir>`
    CheckoutTheme,

    /// Remove everything inside `<workDir><dir>`
    Clear {
        /// Working copy directory
        dir: String,
    },

    /// Remove `<workDir>` entirely
    PrepareWorkDir,

    /// Copy a local directory into `<workDir><dir>`
    Copy {
        /// Source directory
        source: PathBuf,
        /// Working copy directory
        dir: String,
    },

    /// Stage untracked files for addition and missing files for removal
    AddRemove {
        /// Working copy directory
        dir: String,
    },

    /// Commit `<workDir><dir>`, or the whole working copy when `dir` is `None`
    Commit {
        /// Working copy directory
        #[serde(skip_serializing_if = "Option::is_none")]
        dir: Option<String>,
        /// Commit message
        message: String,
    },

    /// Server-side copy of `trunk/` to `tags/<version>/`
    TagRelease {
        /// Tag name
        version: String,
        /// Commit message
        message: String,
    },

    /// Working-copy copy of one version directory to another
    CopyVersion {
        /// Existing version directory
        from: String,
        /// New version directory
        to: String,
    },
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkout { dir } => write!(f, "svn checkout {dir}/"),
            Self::CheckoutTheme => write!(f, "svn checkout repository"),
            Self::Clear { dir } => write!(f, "clear {dir}/"),
            Self::PrepareWorkDir => write!(f, "remove working directory"),
            Self::Copy { source, dir } => write!(f, "copy {} to {dir}/", source.display()),
            Self::AddRemove { dir } => write!(f, "svn add/delete in {dir}/"),
            Self::Commit { message, .. } => write!(f, "svn commit \"{message}\""),
            Self::TagRelease { version, .. } => write!(f, "svn copy trunk/ {TAGS}/{version}/"),
            Self::CopyVersion { from, to } => write!(f, "svn copy {from} {to}"),
        }
    }
}

/// A named unit of work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Identifier used in logs and warnings
    pub name: String,

    /// What the step does
    #[serde(flatten)]
    pub step_type: StepType,
}

impl Step {
    /// Creates a step
    pub fn new(name: impl Into<String>, step_type: StepType) -> Self {
        Self {
            name: name.into(),
            step_type,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.step_type)
    }
}

/// Checks out `trunk` or `assets`
pub fn checkout_dir(dir: &str) -> Step {
    Step::new(
        format!("checkout-{dir}"),
        StepType::Checkout {
            dir: dir.to_string(),
        },
    )
}

/// Clears the checked out trunk
pub fn clear_trunk() -> Step {
    Step::new("clear-trunk", StepType::Clear { dir: TRUNK.to_string() })
}

/// Clears the checked out assets
pub fn clear_assets() -> Step {
    Step::new("clear-assets", StepType::Clear { dir: ASSETS.to_string() })
}

/// Copies the build output into trunk
pub fn copy_build(settings: &EffectiveSettings) -> Step {
    Step::new(
        "copy-build",
        StepType::Copy {
            source: settings.build_dir.clone(),
            dir: TRUNK.to_string(),
        },
    )
}

/// Copies the asset sources into assets
pub fn copy_assets(settings: &EffectiveSettings) -> Step {
    Step::new(
        "copy-assets",
        StepType::Copy {
            source: settings.assets_dir.clone(),
            dir: ASSETS.to_string(),
        },
    )
}

/// Reconciles tracked files in trunk
pub fn add_files(dir: &str) -> Step {
    Step::new(
        format!("add-{dir}"),
        StepType::AddRemove {
            dir: dir.to_string(),
        },
    )
}

/// Reconciles tracked files in assets
pub fn add_assets() -> Step {
    add_files(ASSETS)
}

/// Commits trunk
pub fn commit_to_trunk(settings: &EffectiveSettings) -> Step {
    Step::new(
        "commit-trunk",
        StepType::Commit {
            dir: Some(TRUNK.to_string()),
            message: format!("Committing {} to trunk", settings.new_version),
        },
    )
}

/// Commits assets
pub fn commit_to_assets() -> Step {
    Step::new(
        "commit-assets",
        StepType::Commit {
            dir: Some(ASSETS.to_string()),
            message: "Committing assets".to_string(),
        },
    )
}

/// Tags the release by copying trunk on the server
pub fn commit_tag(settings: &EffectiveSettings) -> Step {
    Step::new(
        "commit-tag",
        StepType::TagRelease {
            version: settings.new_version.clone(),
            message: format!("Tagging {}", settings.new_version),
        },
    )
}

/// Removes the theme working copy
pub fn prepare_work_dir() -> Step {
    Step::new("prepare-workdir", StepType::PrepareWorkDir)
}

/// Checks out the theme repository
pub fn checkout_theme() -> Step {
    Step::new("checkout-theme", StepType::CheckoutTheme)
}

/// Creates the new theme version from the previous one
pub fn create_theme_tag(settings: &EffectiveSettings) -> Step {
    Step::new(
        "create-theme-tag",
        StepType::CopyVersion {
            from: settings.earlier_version.clone(),
            to: settings.new_version.clone(),
        },
    )
}

/// Clears the new theme version directory
pub fn clear_theme(settings: &EffectiveSettings) -> Step {
    Step::new(
        "clear-theme",
        StepType::Clear {
            dir: settings.new_version.clone(),
        },
    )
}

/// Copies the build output into the new theme version directory
pub fn copy_theme(settings: &EffectiveSettings) -> Step {
    Step::new(
        "copy-theme",
        StepType::Copy {
            source: settings.build_dir.clone(),
            dir: settings.new_version.clone(),
        },
    )
}

/// Reconciles tracked files in the new theme version directory
pub fn add_theme_files(settings: &EffectiveSettings) -> Step {
    Step::new(
        "add-theme",
        StepType::AddRemove {
            dir: settings.new_version.clone(),
        },
    )
}

/// Commits the theme working copy
pub fn commit_theme(settings: &EffectiveSettings) -> Step {
    Step::new(
        "commit-theme",
        StepType::Commit {
            dir: None,
            message: format!("Committing theme {}", settings.new_version),
        },
    )
}

impl Step {
    /// Runs the step.
    ///
    /// # Errors
    ///
    /// Returns [`FatalStepError`] only when the run cannot continue. Every
    /// other failure is recorded on `ctx` as a warning.
    pub async fn execute(
        &self,
        ctx: &mut PipelineContext,
        env: &StepEnv,
    ) -> Result<(), FatalStepError> {
        let settings = ctx.shared_settings();
        let svn = SvnClient::new(&settings.username);

        match &self.step_type {
            StepType::Checkout { dir } => {
                let url = settings.repo_url(dir);
                tracing::info!("Checking out {url}...");
                self.ensure_work_dir(&settings, env).await?;
                let cmd = svn.checkout(&url, &settings.work_path(dir));
                if self.run(ctx, env, &cmd, None).await?.is_some() {
                    tracing::info!("Check out complete.");
                }
            }
            StepType::CheckoutTheme => {
                tracing::info!("Checking out {}...", settings.url);
                self.ensure_work_dir(&settings, env).await?;
                let cmd = svn.checkout(settings.url.as_str(), &settings.work_dir);
                if self.run(ctx, env, &cmd, None).await?.is_some() {
                    tracing::info!("Check out complete.");
                }
            }
            StepType::Clear { dir } => {
                tracing::info!("Clearing {dir}.");
                let target = settings.work_path(dir);
                let result = env.fs.clear_dir(&target).await;
                self.record_fs(ctx, "clear", &target, result);
            }
            StepType::PrepareWorkDir => {
                tracing::info!("Removing {}", settings.work_dir.display());
                let result = env.fs.remove_dir(&settings.work_dir).await;
                self.record_fs(ctx, "remove", &settings.work_dir, result);
            }
            StepType::Copy { source, dir } => {
                let dest = settings.work_path(dir);
                tracing::info!("Copying {} to {}", source.display(), dest.display());
                let result = env.fs.copy_dir(source, &dest).await;
                self.record_fs(ctx, "copy", source, result);
            }
            StepType::AddRemove { dir } => {
                tracing::info!("Adding files in {dir}");
                self.add_remove(ctx, env, &svn, &settings.work_path(dir))
                    .await?;
            }
            StepType::Commit { dir, message } => {
                let cwd = dir
                    .as_deref()
                    .map_or_else(|| settings.work_dir.clone(), |d| settings.work_path(d));
                tracing::info!("{message}");
                let committed = self
                    .run(ctx, env, &svn.commit(message), Some(cwd.as_path()))
                    .await?;
                if committed.is_none() {
                    tracing::error!(step = %self.name, "Failed to commit {}", cwd.display());
                }
            }
            StepType::TagRelease { version, message } => {
                tracing::info!("{message}");
                let cmd = svn.remote_copy(
                    &settings.repo_url(TRUNK),
                    &settings.repo_url(&format!("{TAGS}/{version}")),
                    message,
                );
                // URL to URL, no working copy involved.
                let tagged = self.run(ctx, env, &cmd, None).await?;
                if tagged.is_none() {
                    tracing::error!(step = %self.name, "Failed to commit tag {version}");
                }
            }
            StepType::CopyVersion { from, to } => {
                tracing::info!("Tagging {to} from {from}");
                let cmd = svn.local_copy(from, to);
                self.run(ctx, env, &cmd, Some(settings.work_dir.as_path()))
                    .await?;
            }
        }

        Ok(())
    }

    async fn ensure_work_dir(
        &self,
        settings: &EffectiveSettings,
        env: &StepEnv,
    ) -> Result<(), FatalStepError> {
        env.fs
            .ensure_dir(&settings.work_dir)
            .await
            .map_err(|e| FatalStepError::WorkDir {
                step: self.name.clone(),
                path: settings.work_dir.clone(),
                reason: e.to_string(),
            })
    }

    async fn add_remove(
        &self,
        ctx: &mut PipelineContext,
        env: &StepEnv,
        svn: &SvnClient,
        cwd: &Path,
    ) -> Result<(), FatalStepError> {
        self.run(ctx, env, &svn.resolve_working(), Some(cwd)).await?;

        let Some(status) = self.run(ctx, env, &svn.status(), Some(cwd)).await? else {
            return Ok(());
        };
        if status.truncated {
            let err = CommandError::Truncated {
                command: svn.status().to_string(),
                limit: ctx.settings().max_output_bytes,
            };
            tracing::warn!(step = %self.name, error = %err, "Skipping add/delete");
            ctx.warn(&self.name, err);
            return Ok(());
        }

        let changes = parse_status(&status.stdout);
        tracing::debug!(
            untracked = changes.untracked.len(),
            missing = changes.missing.len(),
            "Parsed svn status"
        );

        if !changes.untracked.is_empty() {
            self.run(ctx, env, &svn.add(&changes.untracked), Some(cwd))
                .await?;
        }
        if !changes.missing.is_empty() {
            self.run(ctx, env, &svn.delete(&changes.missing), Some(cwd))
                .await?;
        }
        Ok(())
    }

    /// Runs a command, recording a warning on failure.
    ///
    /// Returns the output when the command succeeded.
    async fn run(
        &self,
        ctx: &mut PipelineContext,
        env: &StepEnv,
        command: &CommandLine,
        cwd: Option<&Path>,
    ) -> Result<Option<CommandOutput>, FatalStepError> {
        let mut options = RunOptions::new(ctx.settings().max_output_bytes);
        if let Some(dir) = cwd {
            options = options.in_dir(dir);
        }

        let result = env
            .runner
            .run(command, &options)
            .await
            .and_then(|output| output.check(command));

        match result {
            Ok(output) => Ok(Some(output)),
            Err(CommandError::Cancelled { .. }) => Err(FatalStepError::Cancelled {
                step: self.name.clone(),
            }),
            Err(err) => {
                tracing::warn!(step = %self.name, error = %err, "Command failed");
                ctx.warn(&self.name, err);
                Ok(None)
            }
        }
    }

    fn record_fs(
        &self,
        ctx: &mut PipelineContext,
        operation: &'static str,
        path: &Path,
        result: std::io::Result<()>,
    ) {
        if let Err(e) = result {
            let err = CommandError::Filesystem {
                operation,
                path: path.to_path_buf(),
                reason: e.to_string(),
            };
            tracing::warn!(step = %self.name, error = %err, "Filesystem operation failed");
            ctx.warn(&self.name, err);
        }
    }
}
