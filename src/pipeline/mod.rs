//! Deployment domain types and logic
//!
//! Settings resolution, the step library, plan selection and the run context
//! live here. Nothing in this module spawns a process directly; execution goes
//! through the capabilities in [`crate::executor`].

pub mod errors;
pub mod plan;
pub mod settings;
pub mod steps;
pub mod types;

pub use errors::{CommandError, ConfigError, FatalStepError};
pub use plan::StepPlan;
pub use settings::{
    Defaults, EffectiveSettings, Overrides, PackageInfo, RepoType, DEFAULT_MAX_OUTPUT_BYTES,
    resolve,
};
pub use steps::{Step, StepType};
pub use types::{PipelineContext, RunReport, RunStatus, StepWarning};
