//! Prelude module for common imports

// Settings and plan
pub use crate::pipeline::errors::{CommandError, ConfigError, FatalStepError};
pub use crate::pipeline::plan::{StepPlan, build as build_plan};
pub use crate::pipeline::settings::{
    Defaults, EffectiveSettings, Overrides, PackageInfo, RepoType, resolve,
};
pub use crate::pipeline::steps::{Step, StepType};
pub use crate::pipeline::types::{PipelineContext, RunReport, RunStatus, StepWarning};

// Execution
pub use crate::executor::{
    CancelHandle, CancelSignal, CommandRunner, DryRunFs, FileSystem, LocalFs, RecordingRunner,
    Sequencer, StepEnv, TokioCommandRunner, cancel_pair,
};

// Infrastructure
pub use crate::infrastructure::{Manifest, SvnClient};
