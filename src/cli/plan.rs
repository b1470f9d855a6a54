//! `wp-deployer plan` - Print the step plan without running it

use super::PlanFormat;
use super::deploy::SettingsArgs;
use anyhow::{Context, Result};
use serde::Serialize;
use wp_deployer::pipeline::{EffectiveSettings, StepPlan, plan};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanOutput<'a> {
    settings: &'a EffectiveSettings,
    steps: &'a StepPlan,
}

/// Renders the plan for `settings` in `format`
pub fn render_plan(settings: &EffectiveSettings, format: PlanFormat) -> Result<String> {
    let steps = plan::build(settings);
    match format {
        PlanFormat::Text => {
            let mut out = format!(
                "{} {} {} -> {}\n",
                settings.repo_type, settings.slug, settings.new_version, settings.url
            );
            if steps.is_empty() {
                out.push_str("Nothing to deploy.\n");
            } else {
                out.push_str(&steps.to_string());
            }
            Ok(out)
        }
        PlanFormat::Json => serde_json::to_string_pretty(&PlanOutput {
            settings,
            steps: &steps,
        })
        .context("Failed to serialize plan"),
    }
}

/// Resolves settings and prints the plan to stdout
pub fn print_plan(args: &SettingsArgs, format: PlanFormat) -> Result<()> {
    let settings = args.resolve()?;
    print!("{}", render_plan(&settings, format)?);
    Ok(())
}
