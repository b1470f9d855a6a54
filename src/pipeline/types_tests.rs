//! Tests for run types

use super::*;
use crate::pipeline::settings::{Defaults, Overrides, PackageInfo, resolve};
use std::path::PathBuf;

fn settings() -> Arc<EffectiveSettings> {
    let defaults = Defaults::for_package(&PackageInfo {
        name: "demo".to_string(),
        version: "1.2.0".to_string(),
    });
    let overrides = Overrides {
        username: Some("jane".to_string()),
        ..Overrides::default()
    };
    Arc::new(resolve(defaults, overrides).unwrap())
}

fn failed_checkout() -> CommandError {
    CommandError::Failed {
        command: "svn co".to_string(),
        code: Some(1),
        stderr: "E170000".to_string(),
    }
}

#[test]
fn test_run_status_is_success() {
    assert!(RunStatus::Succeeded.is_success());
    assert!(!RunStatus::Failed.is_success());
    assert!(!RunStatus::Cancelled.is_success());
}

#[test]
fn test_run_status_display() {
    assert_eq!(RunStatus::Succeeded.to_string(), "SUCCESS");
    assert_eq!(RunStatus::Failed.to_string(), "FAILURE");
    assert_eq!(RunStatus::Cancelled.to_string(), "CANCELLED");
}

#[test]
fn test_run_status_serialization() {
    assert_eq!(
        serde_json::to_string(&RunStatus::Succeeded).unwrap(),
        "\"succeeded\""
    );
}

#[test]
fn test_context_accumulates_warnings() {
    let mut ctx = PipelineContext::new(settings());
    assert!(ctx.warnings().is_empty());

    ctx.warn("checkout-assets", failed_checkout());
    ctx.complete_step();

    assert_eq!(ctx.warnings().len(), 1);
    assert_eq!(ctx.warnings()[0].step, "checkout-assets");
    assert_eq!(ctx.steps_completed(), 1);
    assert_eq!(ctx.settings().work_dir, PathBuf::from("/tmp/demo/"));
}

#[test]
fn test_warning_display() {
    let warning = StepWarning {
        step: "checkout-assets".to_string(),
        error: failed_checkout(),
    };
    assert_eq!(
        warning.to_string(),
        "[checkout-assets] `svn co` exited with code 1: E170000"
    );
}

#[test]
fn test_finish_builds_report() {
    let mut ctx = PipelineContext::new(settings());
    let run_id = ctx.run_id;
    ctx.warn("checkout-assets", failed_checkout());
    ctx.complete_step();

    let report = ctx.finish(RunStatus::Succeeded, 1, None, Duration::from_millis(5));
    assert_eq!(report.run_id, run_id);
    assert!(report.is_success());
    assert!(report.has_warnings());
    assert!(!report.is_clean());
    assert_eq!(report.steps_completed, 1);
    assert_eq!(report.steps_total, 1);
}

#[test]
fn test_clean_report() {
    let ctx = PipelineContext::new(settings());
    let report = ctx.finish(RunStatus::Succeeded, 0, None, Duration::ZERO);
    assert!(report.is_clean());
}

#[test]
fn test_shared_settings_is_the_same_allocation() {
    let settings = settings();
    let ctx = PipelineContext::new(settings.clone());
    assert!(Arc::ptr_eq(&ctx.shared_settings(), &settings));
}
