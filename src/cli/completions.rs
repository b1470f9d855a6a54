//! `wp-deployer completions` - Generate shell completions
//!
//! Supports bash, zsh, fish, and PowerShell.

use anyhow::{Context, Result};
use clap_complete::Shell;
use std::fs;
use std::path::Path;

/// Binary name completions are generated for
const BIN_NAME: &str = "wp-deployer";

pub fn generate_completions(shell: Shell) -> Result<String> {
    use clap_complete::generate;

    let mut cmd = super::build_cli();
    let mut buf = Vec::new();
    generate(shell, &mut cmd, BIN_NAME, &mut buf);

    String::from_utf8(buf).context("Failed to generate completions")
}

pub fn save_completions(completions: &str, output_path: &Path) -> Result<()> {
    fs::write(output_path, completions)
        .with_context(|| format!("Failed to write completions to: {}", output_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_bash_completions() {
        let completions = generate_completions(Shell::Bash).unwrap();
        assert!(completions.contains("wp-deployer"));
        assert!(completions.contains("deploy"));
    }

    #[test]
    fn test_generate_zsh_completions() {
        let completions = generate_completions(Shell::Zsh).unwrap();
        assert!(completions.contains("--dry-run"));
    }

    #[test]
    fn test_save_completions() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("wp-deployer.fish");
        let completions = generate_completions(Shell::Fish).unwrap();

        save_completions(&completions, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), completions);
    }
}
