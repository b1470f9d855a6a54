//! Settings resolution
//!
//! Deployment settings come from three layers, merged shallowly in order:
//!
//! 1. [`Defaults`] derived from the package name and version
//! 2. [`Overrides`] from the manifest's `wpDeployer` block
//! 3. [`Overrides`] from the command line
//!
//! [`resolve`] turns the merged layers into an immutable [`EffectiveSettings`].
//! `workDir` is derived from `tmpDir` and `slug` after merging and cannot be
//! overridden.

use super::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// Default cap on captured command output, in bytes
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 200 * 1024;

/// Kind of artifact being released
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum RepoType {
    /// A plugin, released through `trunk/` and `tags/`
    #[default]
    Plugin,
    /// A theme, released as one directory per version
    Theme,
}

impl RepoType {
    /// Returns the default SVN repository URL for a package of this type
    #[must_use]
    pub fn default_url(self, package_name: &str) -> String {
        match self {
            Self::Plugin => format!("https://plugins.svn.wordpress.org/{package_name}/"),
            Self::Theme => format!("https://themes.svn.wordpress.org/{package_name}/"),
        }
    }

    /// Returns the lowercase name used in configuration
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plugin => "plugin",
            Self::Theme => "theme",
        }
    }
}

impl fmt::Display for RepoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RepoType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plugin" => Ok(Self::Plugin),
            "theme" => Ok(Self::Theme),
            other => Err(ConfigError::UnknownRepoType(other.to_string())),
        }
    }
}

impl TryFrom<String> for RepoType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Package metadata read from the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Package name, used as the default slug
    pub name: String,
    /// Package version, used as the default release version
    pub version: String,
}

/// Built-in settings for a package, before any override is applied
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(missing_docs, clippy::struct_excessive_bools)]
pub struct Defaults {
    /// Package name, used to derive the URL when none is set
    pub package_name: String,
    /// Repository URL; `None` derives it from the repo type
    pub url: Option<String>,
    pub slug: String,
    pub main_file: String,
    pub username: String,
    pub repo_type: RepoType,
    pub build_dir: String,
    pub assets_dir: String,
    pub tmp_dir: String,
    pub new_version: String,
    pub earlier_version: String,
    pub deploy_trunk: bool,
    pub deploy_tag: bool,
    pub deploy_assets: bool,
    pub max_output_bytes: usize,
}

impl Defaults {
    /// Creates the built-in defaults for a package
    #[must_use]
    pub fn for_package(package: &PackageInfo) -> Self {
        Self {
            package_name: package.name.clone(),
            url: None,
            slug: package.name.clone(),
            main_file: format!("{}.php", package.name),
            username: String::new(),
            repo_type: RepoType::Plugin,
            build_dir: "dist".to_string(),
            assets_dir: ".wordpress-org".to_string(),
            tmp_dir: "/tmp/".to_string(),
            new_version: package.version.clone(),
            earlier_version: String::new(),
            deploy_trunk: true,
            deploy_tag: true,
            deploy_assets: false,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }
}

/// A partial set of settings. Every present field replaces the one below it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(missing_docs)]
pub struct Overrides {
    pub url: Option<String>,
    pub slug: Option<String>,
    pub main_file: Option<String>,
    pub username: Option<String>,
    pub repo_type: Option<RepoType>,
    pub build_dir: Option<String>,
    pub assets_dir: Option<String>,
    pub tmp_dir: Option<String>,
    pub new_version: Option<String>,
    pub earlier_version: Option<String>,
    pub deploy_trunk: Option<bool>,
    pub deploy_tag: Option<bool>,
    pub deploy_assets: Option<bool>,
    pub max_output_bytes: Option<usize>,
}

impl Overrides {
    /// Layers `upper` on top of `self`; fields set in `upper` win
    #[must_use]
    pub fn merge(self, upper: Overrides) -> Overrides {
        Overrides {
            url: upper.url.or(self.url),
            slug: upper.slug.or(self.slug),
            main_file: upper.main_file.or(self.main_file),
            username: upper.username.or(self.username),
            repo_type: upper.repo_type.or(self.repo_type),
            build_dir: upper.build_dir.or(self.build_dir),
            assets_dir: upper.assets_dir.or(self.assets_dir),
            tmp_dir: upper.tmp_dir.or(self.tmp_dir),
            new_version: upper.new_version.or(self.new_version),
            earlier_version: upper.earlier_version.or(self.earlier_version),
            deploy_trunk: upper.deploy_trunk.or(self.deploy_trunk),
            deploy_tag: upper.deploy_tag.or(self.deploy_tag),
            deploy_assets: upper.deploy_assets.or(self.deploy_assets),
            max_output_bytes: upper.max_output_bytes.or(self.max_output_bytes),
        }
    }
}

/// Fully resolved, read-only deployment settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[allow(missing_docs, clippy::struct_excessive_bools)]
pub struct EffectiveSettings {
    /// Repository root, always ending with `/`
    pub url: Url,
    pub slug: String,
    pub main_file: String,
    pub username: String,
    pub repo_type: RepoType,
    /// Build output directory, always ending with a separator
    pub build_dir: PathBuf,
    /// Asset source directory, always ending with a separator
    pub assets_dir: PathBuf,
    /// Temp directory, always ending with a separator
    pub tmp_dir: PathBuf,
    /// `tmpDir` + `slug`, always ending with a separator
    pub work_dir: PathBuf,
    pub new_version: String,
    pub earlier_version: String,
    pub deploy_trunk: bool,
    pub deploy_tag: bool,
    pub deploy_assets: bool,
    pub max_output_bytes: usize,
}

impl EffectiveSettings {
    /// Returns the repository URL of a directory below the root, with a trailing `/`
    #[must_use]
    pub fn repo_url(&self, dir: &str) -> String {
        format!("{}{}/", self.url, dir.trim_matches('/'))
    }

    /// Returns a path inside the working directory
    #[must_use]
    pub fn work_path(&self, dir: &str) -> PathBuf {
        self.work_dir.join(dir)
    }
}

/// Resolves defaults and overrides into effective settings.
///
/// Touches neither the filesystem nor the network.
///
/// # Errors
///
/// Returns [`ConfigError`] when the username is empty, when a theme release
/// has no `earlierVersion`, when a path-deriving field is empty, or when the
/// URL does not parse.
pub fn resolve(defaults: Defaults, overrides: Overrides) -> Result<EffectiveSettings, ConfigError> {
    let username = overrides.username.unwrap_or(defaults.username);
    if username.trim().is_empty() {
        return Err(ConfigError::MissingUsername);
    }

    let repo_type = overrides.repo_type.unwrap_or(defaults.repo_type);
    let earlier_version = overrides
        .earlier_version
        .unwrap_or(defaults.earlier_version);
    if repo_type == RepoType::Theme && earlier_version.trim().is_empty() {
        return Err(ConfigError::MissingEarlierVersion);
    }

    let slug = non_empty("slug", overrides.slug.unwrap_or(defaults.slug))?;
    let new_version = non_empty(
        "newVersion",
        overrides.new_version.unwrap_or(defaults.new_version),
    )?;
    let build_dir = non_empty("buildDir", overrides.build_dir.unwrap_or(defaults.build_dir))?;
    let tmp_dir = non_empty("tmpDir", overrides.tmp_dir.unwrap_or(defaults.tmp_dir))?;
    let assets_dir = overrides.assets_dir.unwrap_or(defaults.assets_dir);

    let url = overrides
        .url
        .or(defaults.url)
        .unwrap_or_else(|| repo_type.default_url(&defaults.package_name));
    let url = parse_repo_url(&url)?;

    let tmp_dir = with_trailing_separator(&tmp_dir);
    let work_dir = with_trailing_separator(&format!("{tmp_dir}{slug}"));

    Ok(EffectiveSettings {
        url,
        slug,
        main_file: overrides.main_file.unwrap_or(defaults.main_file),
        username,
        repo_type,
        build_dir: PathBuf::from(with_trailing_separator(&build_dir)),
        assets_dir: PathBuf::from(with_trailing_separator(&assets_dir)),
        tmp_dir: PathBuf::from(tmp_dir),
        work_dir: PathBuf::from(work_dir),
        new_version,
        earlier_version,
        deploy_trunk: overrides.deploy_trunk.unwrap_or(defaults.deploy_trunk),
        deploy_tag: overrides.deploy_tag.unwrap_or(defaults.deploy_tag),
        deploy_assets: overrides.deploy_assets.unwrap_or(defaults.deploy_assets),
        max_output_bytes: overrides
            .max_output_bytes
            .unwrap_or(defaults.max_output_bytes),
    })
}

fn non_empty(field: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::EmptyField { field })
    } else {
        Ok(value)
    }
}

fn parse_repo_url(raw: &str) -> Result<Url, ConfigError> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

/// Appends a path separator unless the path already ends with one
#[must_use]
pub fn with_trailing_separator(path: &str) -> String {
    if path.ends_with('/') || path.ends_with(MAIN_SEPARATOR) {
        path.to_string()
    } else {
        format!("{path}{MAIN_SEPARATOR}")
    }
}

/// Returns true if the path's textual form ends with a separator
#[must_use]
pub fn has_trailing_separator(path: &Path) -> bool {
    let text = path.to_string_lossy();
    text.ends_with('/') || text.ends_with(MAIN_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn demo_defaults() -> Defaults {
        Defaults::for_package(&PackageInfo {
            name: "demo".to_string(),
            version: "1.2.0".to_string(),
        })
    }

    fn with_user() -> Overrides {
        Overrides {
            username: Some("jane".to_string()),
            ..Overrides::default()
        }
    }

    #[test]
    fn test_plugin_defaults() {
        let settings = resolve(demo_defaults(), with_user()).unwrap();

        assert_eq!(settings.url.as_str(), "https://plugins.svn.wordpress.org/demo/");
        assert_eq!(settings.slug, "demo");
        assert_eq!(settings.main_file, "demo.php");
        assert_eq!(settings.repo_type, RepoType::Plugin);
        assert_eq!(settings.build_dir, PathBuf::from("dist/"));
        assert_eq!(settings.assets_dir, PathBuf::from(".wordpress-org/"));
        assert_eq!(settings.work_dir, PathBuf::from("/tmp/demo/"));
        assert_eq!(settings.new_version, "1.2.0");
        assert!(settings.deploy_trunk);
        assert!(settings.deploy_tag);
        assert!(!settings.deploy_assets);
        assert_eq!(settings.max_output_bytes, DEFAULT_MAX_OUTPUT_BYTES);
    }

    #[test]
    fn test_theme_url_follows_repo_type_override() {
        let overrides = Overrides {
            repo_type: Some(RepoType::Theme),
            earlier_version: Some("1.1.0".to_string()),
            ..with_user()
        };
        let settings = resolve(demo_defaults(), overrides).unwrap();
        assert_eq!(settings.url.as_str(), "https://themes.svn.wordpress.org/demo/");
    }

    #[test]
    fn test_missing_username() {
        let result = resolve(demo_defaults(), Overrides::default());
        assert_eq!(result.unwrap_err(), ConfigError::MissingUsername);
    }

    #[test]
    fn test_blank_username_is_missing() {
        let overrides = Overrides {
            username: Some("   ".to_string()),
            ..Overrides::default()
        };
        assert_eq!(
            resolve(demo_defaults(), overrides).unwrap_err(),
            ConfigError::MissingUsername
        );
    }

    #[test]
    fn test_theme_requires_earlier_version() {
        let overrides = Overrides {
            repo_type: Some(RepoType::Theme),
            ..with_user()
        };
        assert_eq!(
            resolve(demo_defaults(), overrides).unwrap_err(),
            ConfigError::MissingEarlierVersion
        );
    }

    #[test]
    fn test_plugin_does_not_require_earlier_version() {
        assert!(resolve(demo_defaults(), with_user()).is_ok());
    }

    #[test]
    fn test_work_dir_derived_after_merge() {
        let overrides = Overrides {
            slug: Some("other-slug".to_string()),
            tmp_dir: Some("/var/tmp".to_string()),
            ..with_user()
        };
        let settings = resolve(demo_defaults(), overrides).unwrap();
        assert_eq!(settings.tmp_dir, PathBuf::from("/var/tmp/"));
        assert_eq!(settings.work_dir, PathBuf::from("/var/tmp/other-slug/"));
    }

    #[test]
    fn test_explicit_url_is_normalized() {
        let overrides = Overrides {
            url: Some("https://svn.example.org/demo".to_string()),
            ..with_user()
        };
        let settings = resolve(demo_defaults(), overrides).unwrap();
        assert_eq!(settings.url.as_str(), "https://svn.example.org/demo/");
        assert_eq!(
            settings.repo_url("trunk"),
            "https://svn.example.org/demo/trunk/"
        );
        assert_eq!(
            settings.repo_url("tags/1.2.0"),
            "https://svn.example.org/demo/tags/1.2.0/"
        );
    }

    #[test]
    fn test_invalid_url() {
        let overrides = Overrides {
            url: Some("not a url".to_string()),
            ..with_user()
        };
        assert!(matches!(
            resolve(demo_defaults(), overrides),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_empty_slug_rejected() {
        let overrides = Overrides {
            slug: Some(String::new()),
            ..with_user()
        };
        assert_eq!(
            resolve(demo_defaults(), overrides).unwrap_err(),
            ConfigError::EmptyField { field: "slug" }
        );
    }

    #[test]
    fn test_merge_upper_wins_and_keeps_lower() {
        let lower = Overrides {
            username: Some("manifest-user".to_string()),
            build_dir: Some("build".to_string()),
            deploy_tag: Some(false),
            ..Overrides::default()
        };
        let upper = Overrides {
            username: Some("cli-user".to_string()),
            deploy_tag: Some(true),
            ..Overrides::default()
        };

        let merged = lower.merge(upper);
        assert_eq!(merged.username.as_deref(), Some("cli-user"));
        assert_eq!(merged.build_dir.as_deref(), Some("build"));
        assert_eq!(merged.deploy_tag, Some(true));
    }

    #[test]
    fn test_overrides_from_camel_case_json() {
        let overrides: Overrides = serde_json::from_str(
            r#"{"username":"jane","repoType":"theme","earlierVersion":"1.0.0","deployAssets":true,"maxOutputBytes":1024,"workDir":"/ignored"}"#,
        )
        .unwrap();
        assert_eq!(overrides.repo_type, Some(RepoType::Theme));
        assert_eq!(overrides.deploy_assets, Some(true));
        assert_eq!(overrides.max_output_bytes, Some(1024));

        let settings = resolve(demo_defaults(), overrides).unwrap();
        assert_eq!(settings.work_dir, PathBuf::from("/tmp/demo/"));
    }

    #[test]
    fn test_repo_type_from_str() {
        assert_eq!("Plugin".parse::<RepoType>().unwrap(), RepoType::Plugin);
        assert_eq!("theme".parse::<RepoType>().unwrap(), RepoType::Theme);
        assert_eq!(
            "block".parse::<RepoType>().unwrap_err(),
            ConfigError::UnknownRepoType("block".to_string())
        );
    }

    #[test]
    fn test_repo_type_json_is_case_insensitive() {
        let overrides: Overrides = serde_json::from_str(r#"{"repoType":"Theme"}"#).unwrap();
        assert_eq!(overrides.repo_type, Some(RepoType::Theme));

        let err = serde_json::from_str::<Overrides>(r#"{"repoType":"block"}"#).unwrap_err();
        assert!(err.to_string().contains("Unknown repoType 'block'"));
        assert_eq!(serde_json::to_string(&RepoType::Plugin).unwrap(), r#""plugin""#);
    }

    proptest! {
        #[test]
        fn prop_trailing_separator_is_idempotent(path in "[a-zA-Z0-9_./-]{1,40}") {
            let once = with_trailing_separator(&path);
            prop_assert!(has_trailing_separator(Path::new(&once)));
            prop_assert_eq!(with_trailing_separator(&once), once.clone());
        }

        #[test]
        fn prop_build_dir_always_normalized(dir in "[a-z]{1,12}(/[a-z]{1,12}){0,3}/?") {
            let overrides = Overrides {
                build_dir: Some(dir),
                ..with_user()
            };
            let settings = resolve(demo_defaults(), overrides).unwrap();
            prop_assert!(has_trailing_separator(&settings.build_dir));
            prop_assert!(has_trailing_separator(&settings.work_dir));
        }
    }
}
