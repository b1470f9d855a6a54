//! Package manifest loading
//!
//! Reads `name` and `version` from a `package.json` and the optional
//! `wpDeployer` block of setting overrides.

use crate::pipeline::{Defaults, Overrides, PackageInfo};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading a manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The file could not be read
    #[error("Failed to read manifest '{}': {source}", .path.display())]
    Read {
        /// Manifest path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not valid JSON or has mistyped keys
    #[error("Failed to parse manifest '{}': {source}", .path.display())]
    Parse {
        /// Manifest path
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },

    /// A required key is absent or empty
    #[error("Manifest '{}' has no '{field}'", .path.display())]
    MissingField {
        /// Manifest path
        path: PathBuf,
        /// Missing key
        field: &'static str,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    wp_deployer: Option<Overrides>,
}

/// A parsed package manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Package name and version
    pub package: PackageInfo,
    /// The `wpDeployer` block, empty when absent
    pub overrides: Overrides,
}

impl Manifest {
    /// Reads and parses the manifest at `path`
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if the file is unreadable, malformed, or
    /// lacks a name or version.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        tracing::debug!(path = %path.display(), "Loading manifest");
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content, path)
    }

    /// Parses manifest JSON; `path` is only used in errors
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError`] if the JSON is malformed or lacks a name or
    /// version.
    pub fn from_json(content: &str, path: &Path) -> Result<Self, ManifestError> {
        let raw: RawManifest =
            serde_json::from_str(content).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let required = |value: Option<String>, field: &'static str| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ManifestError::MissingField {
                    path: path.to_path_buf(),
                    field,
                })
        };

        Ok(Self {
            package: PackageInfo {
                name: required(raw.name, "name")?,
                version: required(raw.version, "version")?,
            },
            overrides: raw.wp_deployer.unwrap_or_default(),
        })
    }

    /// Built-in defaults for this package
    #[must_use]
    pub fn defaults(&self) -> Defaults {
        Defaults::for_package(&self.package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RepoType;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn path() -> &'static Path {
        Path::new("package.json")
    }

    #[test]
    fn test_minimal_manifest() {
        let manifest =
            Manifest::from_json(r#"{"name": "demo", "version": "1.2.0"}"#, path()).unwrap();
        assert_eq!(manifest.package.name, "demo");
        assert_eq!(manifest.package.version, "1.2.0");
        assert_eq!(manifest.overrides, Overrides::default());
        assert_eq!(manifest.defaults().slug, "demo");
    }

    #[test]
    fn test_deployer_block_and_unknown_keys() {
        let json = r#"{
            "name": "demo",
            "version": "1.2.0",
            "scripts": {"build": "webpack"},
            "wpDeployer": {
                "username": "jane",
                "repoType": "theme",
                "earlierVersion": "1.1.0",
                "deployAssets": true
            }
        }"#;
        let manifest = Manifest::from_json(json, path()).unwrap();
        assert_eq!(manifest.overrides.username.as_deref(), Some("jane"));
        assert_eq!(manifest.overrides.repo_type, Some(RepoType::Theme));
        assert_eq!(manifest.overrides.earlier_version.as_deref(), Some("1.1.0"));
        assert_eq!(manifest.overrides.deploy_assets, Some(true));
    }

    #[test]
    fn test_missing_version() {
        let err = Manifest::from_json(r#"{"name": "demo"}"#, path()).unwrap_err();
        assert!(matches!(
            err,
            ManifestError::MissingField {
                field: "version",
                ..
            }
        ));
    }

    #[test]
    fn test_blank_name() {
        let err = Manifest::from_json(r#"{"name": " ", "version": "1.0.0"}"#, path()).unwrap_err();
        assert_eq!(err.to_string(), "Manifest 'package.json' has no 'name'");
    }

    #[test]
    fn test_malformed_json() {
        let err = Manifest::from_json("{", path()).unwrap_err();
        assert!(matches!(err, ManifestError::Parse { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("package.json");
        std::fs::write(&file, r#"{"name": "demo", "version": "2.0.0"}"#).unwrap();

        let manifest = Manifest::load(&file).unwrap();
        assert_eq!(manifest.package.version, "2.0.0");

        let err = Manifest::load(&temp.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
    }
}
