//! # wp-deployer - WordPress.org release automation
//!
//! Publishes a built WordPress plugin or theme to its WordPress.org
//! Subversion repository by driving the `svn` client through an ordered list
//! of steps.
//!
//! ## Layout
//!
//! - [`pipeline`]: settings resolution, the step library and plan selection
//! - [`executor`]: command and filesystem capabilities, and the sequencer
//! - [`infrastructure`]: manifest loading, `svn` command surface, logging
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use wp_deployer::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = Manifest::load(std::path::Path::new("package.json"))?;
//! let cli = Overrides {
//!     username: Some("jane".to_string()),
//!     ..Overrides::default()
//! };
//! let settings = Arc::new(resolve(manifest.defaults(), manifest.overrides.merge(cli))?);
//! let plan = build_plan(&settings);
//!
//! let env = StepEnv::new(Arc::new(TokioCommandRunner::default()), Arc::new(LocalFs::new()));
//! let report = Sequencer::new(env, CancelSignal::never())
//!     .run(&plan, PipelineContext::new(settings))
//!     .await;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod executor;
pub mod infrastructure;
pub mod pipeline;

// Prelude module for common imports
pub mod prelude;

// Re-export commonly used types
pub use executor::{
    CancelHandle, CancelSignal, CommandLine, CommandOutput, CommandRunner, FileSystem, LocalFs,
    RecordingRunner, RunOptions, Sequencer, StepEnv, TokioCommandRunner, cancel_pair,
};
pub use infrastructure::{Manifest, ManifestError, SvnClient};
pub use pipeline::{
    CommandError, ConfigError, EffectiveSettings, FatalStepError, Overrides, PipelineContext,
    RepoType, RunReport, RunStatus, Step, StepPlan, StepType,
};

/// Version of the wp-deployer crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
