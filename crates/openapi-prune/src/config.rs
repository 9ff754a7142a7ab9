//! Project-level pruning configuration loaded from YAML.
//!
//! Keeps the project-specific knobs (which API areas to drop, which path
//! parameters the generated client supplies itself) next to the `OpenAPI`
//! files instead of on every command line.
//!
//! # File format
//!
//! ```yaml
//! # api/openapi/prune.yaml
//!
//! # Paths starting with any of these prefixes are removed, together with
//! # every definition only they referenced.
//! exclude_path_prefixes:
//!   - /api/content
//!
//! # `in: path` parameters removed from every operation.
//! strip_path_parameters:
//!   - app
//!
//! # Compare path prefixes ignoring ASCII case (default: true).
//! case_insensitive: true
//! ```

use std::path::Path;

use serde::Deserialize;

/// Project-level pruning config.
///
/// Loaded from a YAML file via [`ProjectConfig::load`], then applied to a
/// [`PruneConfig`](crate::PruneConfig) via
/// [`PruneConfig::with_project_config`](crate::PruneConfig::with_project_config).
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Path prefixes whose paths are removed.
    pub exclude_path_prefixes: Vec<String>,

    /// Names of `in: path` parameters stripped from every operation.
    pub strip_path_parameters: Vec<String>,

    /// Compare path prefixes ignoring ASCII case.
    pub case_insensitive: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            exclude_path_prefixes: Vec::new(),
            strip_path_parameters: Vec::new(),
            case_insensitive: true,
        }
    }
}

impl ProjectConfig {
    /// Load config from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }
}
