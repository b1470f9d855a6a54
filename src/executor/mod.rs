//! Deployment execution layer
//!
//! This module contains the capability traits steps run against, their real
//! and recording implementations, and the sequencer that drives a plan.

mod cancel;
mod recording;
mod sequencer;
mod shell;
mod traits;
mod workspace;

pub use cancel::{CancelHandle, CancelSignal, cancel_pair};
pub use recording::{RecordedCall, RecordingRunner};
pub use sequencer::Sequencer;
pub use shell::{CommandLine, CommandOutput, RunOptions, TokioCommandRunner};
pub use traits::{CommandRunner, FileSystem, StepEnv};
pub use workspace::{DryRunFs, LocalFs};
