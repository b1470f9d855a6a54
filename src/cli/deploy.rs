//! `wp-deployer deploy` - Publish a release
//!
//! Also home of [`SettingsArgs`], the setting overrides shared by `deploy`
//! and `plan`.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use wp_deployer::executor::{
    CancelHandle, DryRunFs, LocalFs, RecordingRunner, Sequencer, StepEnv, TokioCommandRunner,
    cancel_pair,
};
use wp_deployer::infrastructure::Manifest;
use wp_deployer::pipeline::{
    EffectiveSettings, Overrides, PipelineContext, RepoType, RunReport, RunStatus, plan, resolve,
};

/// Exit code for a run stopped by Ctrl-C
const EXIT_CANCELLED: u8 = 130;

/// Setting overrides from the command line
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Package manifest to read name, version and `wpDeployer` settings from
    #[arg(long, default_value = "package.json")]
    pub manifest: PathBuf,

    /// WordPress.org username
    #[arg(short, long)]
    pub username: Option<String>,

    /// Release a plugin or a theme
    #[arg(long)]
    pub repo_type: Option<RepoType>,

    /// Repository URL
    #[arg(long)]
    pub url: Option<String>,

    /// Repository slug
    #[arg(long)]
    pub slug: Option<String>,

    /// Main plugin file
    #[arg(long)]
    pub main_file: Option<String>,

    /// Directory holding the built release
    #[arg(long)]
    pub build_dir: Option<String>,

    /// Directory holding plugin directory assets
    #[arg(long)]
    pub assets_dir: Option<String>,

    /// Parent of the working copy
    #[arg(long)]
    pub tmp_dir: Option<String>,

    /// Version being released
    #[arg(long)]
    pub new_version: Option<String>,

    /// Existing theme version to base the new one on
    #[arg(long)]
    pub earlier_version: Option<String>,

    /// Commit the build to trunk
    #[arg(long, value_name = "BOOL")]
    pub deploy_trunk: Option<bool>,

    /// Tag the release
    #[arg(long, value_name = "BOOL")]
    pub deploy_tag: Option<bool>,

    /// Commit the assets directory
    #[arg(long, value_name = "BOOL")]
    pub deploy_assets: Option<bool>,

    /// Cap on captured output per command stream, in bytes
    #[arg(long)]
    pub max_output_bytes: Option<usize>,
}

impl SettingsArgs {
    /// Flags as an override layer
    pub fn overrides(&self) -> Overrides {
        Overrides {
            url: self.url.clone(),
            slug: self.slug.clone(),
            main_file: self.main_file.clone(),
            username: self.username.clone(),
            repo_type: self.repo_type,
            build_dir: self.build_dir.clone(),
            assets_dir: self.assets_dir.clone(),
            tmp_dir: self.tmp_dir.clone(),
            new_version: self.new_version.clone(),
            earlier_version: self.earlier_version.clone(),
            deploy_trunk: self.deploy_trunk,
            deploy_tag: self.deploy_tag,
            deploy_assets: self.deploy_assets,
            max_output_bytes: self.max_output_bytes,
        }
    }

    /// Loads the manifest and resolves defaults, manifest and flags
    pub fn resolve(&self) -> Result<Arc<EffectiveSettings>> {
        let manifest = Manifest::load(&self.manifest)?;
        let overrides = manifest.overrides.clone().merge(self.overrides());
        let settings = resolve(manifest.defaults(), overrides)
            .with_context(|| format!("Invalid settings for '{}'", manifest.package.name))?;
        tracing::debug!(?settings, "Resolved settings");
        Ok(Arc::new(settings))
    }
}

/// Runs a deployment and maps its outcome to an exit code
pub async fn deploy(args: &SettingsArgs, dry_run: bool, strict: bool) -> Result<ExitCode> {
    let settings = args.resolve()?;
    let plan = plan::build(&settings);

    let (handle, signal) = cancel_pair();
    tokio::spawn(cancel_on_ctrl_c(handle));

    let env = if dry_run {
        tracing::info!("Dry run: no command or filesystem change will be made");
        StepEnv::new(Arc::new(RecordingRunner::new()), Arc::new(DryRunFs))
    } else {
        StepEnv::new(
            Arc::new(TokioCommandRunner::new(signal.clone())),
            Arc::new(LocalFs::new()),
        )
    };

    println!("Processing...");
    let report = Sequencer::new(env, signal)
        .run(&plan, PipelineContext::new(settings))
        .await;

    print_report(&report);
    Ok(ExitCode::from(exit_status(&report, strict)))
}

async fn cancel_on_ctrl_c(handle: CancelHandle) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!("Interrupt received, cancelling deployment");
        handle.cancel();
    }
}

fn print_report(report: &RunReport) {
    match report.status {
        RunStatus::Succeeded => println!("Deployed successfully."),
        RunStatus::Failed | RunStatus::Cancelled => {
            let reason = report
                .error
                .as_ref()
                .map_or_else(String::new, |e| format!(": {e}"));
            eprintln!(
                "Deployment {} after {}/{} steps{reason}",
                report.status, report.steps_completed, report.steps_total
            );
        }
    }

    if report.has_warnings() {
        eprintln!("{} warning(s):", report.warnings.len());
        for warning in &report.warnings {
            eprintln!("  {warning}");
        }
    }
}

fn exit_status(report: &RunReport, strict: bool) -> u8 {
    match report.status {
        RunStatus::Succeeded if strict && report.has_warnings() => 1,
        RunStatus::Succeeded => 0,
        RunStatus::Failed => 1,
        RunStatus::Cancelled => EXIT_CANCELLED,
    }
}
