//! wp-deployer - Publish WordPress plugins and themes to WordPress.org SVN
//!
//! ## Commands
//!
//! - `wp-deployer deploy` - Check out, sync, commit and tag a release
//! - `wp-deployer plan` - Print the steps a deploy would run
//! - `wp-deployer completions` - Generate shell completions
//!
//! ## Quick Start
//!
//! ```bash
//! # Preview the steps for the package in the current directory
//! wp-deployer plan --username jane
//!
//! # Release trunk, tag and assets
//! wp-deployer deploy --username jane --deploy-assets true
//!
//! # Log every svn invocation without running it
//! wp-deployer deploy --username jane --dry-run
//! ```

use std::process::ExitCode;

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            if std::env::var("WP_DEPLOYER_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::FAILURE
        }
    }
}
