//! Filesystem primitives for the working copy
//!
//! [`LocalFs`] performs the recursive clear/remove/copy operations the reset
//! and copy steps need. [`DryRunFs`] logs them and leaves the disk untouched.

use super::traits::FileSystem;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Entries a clear never removes
const PRESERVED_ENTRIES: &[&str] = &[".svn"];

/// Filesystem operations on the local disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Creates a local filesystem
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileSystem for LocalFs {
    async fn clear_dir(&self, dir: &Path) -> io::Result<()> {
        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if PRESERVED_ENTRIES.iter().any(|keep| name == *keep) {
                continue;
            }
            if entry.file_type().await?.is_dir() {
                tokio::fs::remove_dir_all(entry.path()).await?;
            } else {
                tokio::fs::remove_file(entry.path()).await?;
            }
        }
        Ok(())
    }

    async fn remove_dir(&self, dir: &Path) -> io::Result<()> {
        match tokio::fs::remove_dir_all(dir).await {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }

    async fn copy_dir(&self, src: &Path, dest: &Path) -> io::Result<()> {
        if !tokio::fs::metadata(src).await?.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' is not a directory", src.display()),
            ));
        }

        let mut stack: Vec<(PathBuf, PathBuf)> = vec![(src.to_path_buf(), dest.to_path_buf())];
        while let Some((from, to)) = stack.pop() {
            if tokio::fs::metadata(&from).await?.is_dir() {
                tokio::fs::create_dir_all(&to).await?;
                let mut entries = tokio::fs::read_dir(&from).await?;
                while let Some(entry) = entries.next_entry().await? {
                    stack.push((entry.path(), to.join(entry.file_name())));
                }
            } else {
                tokio::fs::copy(&from, &to).await?;
            }
        }
        Ok(())
    }

    async fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        tokio::fs::create_dir_all(dir).await
    }
}

/// Logs filesystem operations without performing them
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunFs;

#[async_trait]
impl FileSystem for DryRunFs {
    async fn clear_dir(&self, dir: &Path) -> io::Result<()> {
        tracing::info!(dir = %dir.display(), "Dry run: would clear directory");
        Ok(())
    }

    async fn remove_dir(&self, dir: &Path) -> io::Result<()> {
        tracing::info!(dir = %dir.display(), "Dry run: would remove directory");
        Ok(())
    }

    async fn copy_dir(&self, src: &Path, dest: &Path) -> io::Result<()> {
        tracing::info!(src = %src.display(), dest = %dest.display(), "Dry run: would copy directory");
        Ok(())
    }

    async fn ensure_dir(&self, dir: &Path) -> io::Result<()> {
        tracing::info!(dir = %dir.display(), "Dry run: would create directory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_clear_absent_dir_is_noop() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("trunk");

        LocalFs.clear_dir(&missing).await.unwrap();
        LocalFs.clear_dir(&missing).await.unwrap();
        assert!(!missing.exists());
    }

    #[tokio::test]
    async fn test_clear_removes_contents_but_keeps_svn_metadata() {
        let temp = TempDir::new().unwrap();
        let trunk = temp.path().join("trunk");
        write(&trunk.join("a.php"), "<?php");
        write(&trunk.join("inc/b.php"), "<?php");
        write(&trunk.join(".svn/wc.db"), "db");

        LocalFs.clear_dir(&trunk).await.unwrap();

        assert!(trunk.exists());
        assert!(!trunk.join("a.php").exists());
        assert!(!trunk.join("inc").exists());
        assert!(trunk.join(".svn/wc.db").exists());
    }

    #[tokio::test]
    async fn test_remove_dir_absent_and_present() {
        let temp = TempDir::new().unwrap();
        let work = temp.path().join("demo");

        LocalFs.remove_dir(&work).await.unwrap();

        write(&work.join("1.0.0/style.css"), "/* theme */");
        LocalFs.remove_dir(&work).await.unwrap();
        assert!(!work.exists());
    }

    #[tokio::test]
    async fn test_copy_dir_overwrites_and_keeps_extra_files() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("dist");
        let dest = temp.path().join("work/trunk");
        write(&src.join("demo.php"), "new");
        write(&src.join("assets/app.js"), "js");
        write(&dest.join("demo.php"), "old");
        write(&dest.join("stale.txt"), "stale");

        LocalFs.copy_dir(&src, &dest).await.unwrap();

        assert_eq!(fs::read_to_string(dest.join("demo.php")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dest.join("assets/app.js")).unwrap(), "js");
        assert!(dest.join("stale.txt").exists());
    }

    #[tokio::test]
    async fn test_copy_dir_missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let result = LocalFs
            .copy_dir(&temp.path().join("nope"), &temp.path().join("trunk"))
            .await;
        assert!(result.is_err());
        assert!(!temp.path().join("trunk").exists());
    }

    #[tokio::test]
    async fn test_dry_run_touches_nothing() {
        let temp = TempDir::new().unwrap();
        let trunk = temp.path().join("trunk");
        write(&trunk.join("a.php"), "<?php");

        DryRunFs.clear_dir(&trunk).await.unwrap();
        DryRunFs.remove_dir(&trunk).await.unwrap();
        assert!(trunk.join("a.php").exists());
    }
}
