//! CLI for wp-deployer
//!
//! Subcommands:
//! - `deploy`: Publish the build to the WordPress.org repository
//! - `plan`: Print the steps a deploy would run
//! - `completions`: Generate shell completions

pub mod completions;
pub mod deploy;
pub mod plan;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use wp_deployer::infrastructure::init_logging;

/// CLI arguments for wp-deployer
#[derive(Parser, Debug)]
#[command(name = "wp-deployer")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Publish the build to the WordPress.org repository
    Deploy {
        #[command(flatten)]
        settings: deploy::SettingsArgs,
        /// Log every command and filesystem operation instead of running it
        #[arg(long)]
        dry_run: bool,
        /// Exit non-zero when any step recorded a warning
        #[arg(long)]
        strict: bool,
    },

    /// Print the steps a deploy would run
    Plan {
        #[command(flatten)]
        settings: deploy::SettingsArgs,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = PlanFormat::Text)]
        format: PlanFormat,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlanFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Parse and execute CLI arguments
pub async fn run() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(&args.log_level);

    match args.command {
        Command::Deploy {
            settings,
            dry_run,
            strict,
        } => deploy::deploy(&settings, dry_run, strict).await,
        Command::Plan { settings, format } => {
            plan::print_plan(&settings, format)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{completions}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
