//! Project configuration describing where static assets live and how paths are versioned.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cache::MemoryVersionCache;
use crate::file_provider::PhysicalFileProvider;
use crate::version::FileVersionProvider;

/// File name searched for when no configuration path is given.
pub const DEFAULT_CONFIG_FILE: &str = "asset-version.json";

/// Discoverable project configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Directory holding the static assets, relative to the configuration directory.
    pub content_root: String,
    /// Virtual sub-path the application is mounted under.
    pub app_name: Option<String>,
    /// Whether computed versions are memoised and invalidated through file watching.
    pub cache: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            content_root: "wwwroot".into(),
            app_name: None,
            cache: true,
        }
    }
}

impl ProjectConfig {
    /// Attempt to load configuration from the provided directory.
    ///
    /// When the configuration file does not exist or fails to parse we fall back to default
    /// values so callers can continue operating with sensible assumptions.
    pub fn discover(base_dir: &Path) -> Self {
        let candidate = base_dir.join(DEFAULT_CONFIG_FILE);
        match Self::from_path(&candidate) {
            Some(config) => config,
            None => {
                tracing::debug!(
                    path = %candidate.display(),
                    "no usable configuration; using defaults"
                );
                Self::default()
            }
        }
    }

    /// Read configuration from a specific JSON file, ignoring failures.
    pub fn from_path(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Read configuration from a specific JSON file, reporting failures.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Content root resolved against `base_dir`.
    pub fn content_root_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(&self.content_root)
    }

    /// Build a version provider serving the configured content root.
    pub fn build_provider(&self, base_dir: &Path) -> Result<FileVersionProvider> {
        let root = self.content_root_path(base_dir);
        let files = PhysicalFileProvider::new(&root)
            .with_context(|| format!("failed to open content root {}", root.display()))?;

        let mut provider = FileVersionProvider::new(Arc::new(files), self.app_name.clone(), None);
        if self.cache {
            provider = provider.with_cache(Arc::new(MemoryVersionCache::new()));
        }
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn discover_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        assert_eq!(ProjectConfig::discover(dir.path()), ProjectConfig::default());
    }

    #[test]
    fn discover_reads_partial_configuration() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(DEFAULT_CONFIG_FILE),
            r#"{"appName": "testApp", "cache": false}"#,
        )
        .unwrap();

        let config = ProjectConfig::discover(dir.path());
        assert_eq!(config.content_root, "wwwroot");
        assert_eq!(config.app_name.as_deref(), Some("testApp"));
        assert!(!config.cache);
    }

    #[test]
    fn discover_ignores_malformed_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "{ not json").unwrap();
        assert_eq!(ProjectConfig::discover(dir.path()), ProjectConfig::default());
    }

    #[test]
    fn load_reports_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.json");
        let err = ProjectConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to read"));

        fs::write(&path, "42").unwrap();
        let err = ProjectConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn builds_provider_for_content_root() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("public/hello")).unwrap();
        fs::write(dir.path().join("public/hello/world"), "Hello World!").unwrap();

        let config = ProjectConfig {
            content_root: "public".into(),
            app_name: Some("testApp".into()),
            cache: true,
        };
        let provider = config.build_provider(dir.path()).unwrap();

        assert_eq!(
            provider.add_version_to_file_path("/testApp/hello/world").unwrap(),
            "/testApp/hello/world?v=f4OxZX_x_FO5LcGBSKHWXfwtSx-j1ncoSt3SABJtkGk"
        );
    }

    #[test]
    fn missing_content_root_is_an_error() {
        let dir = tempdir().unwrap();
        let err = ProjectConfig::default()
            .build_provider(dir.path())
            .err()
            .unwrap();
        assert!(err.to_string().contains("failed to open content root"));
    }
}
