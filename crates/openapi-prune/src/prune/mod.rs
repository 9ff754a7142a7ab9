//! `OpenAPI` surface pruning pipeline.
//!
//! Parses a document, runs the reference-counting pruner over its typed
//! model, replays the removals on the raw tree and serializes it back.
//!
//! The work is split across:
//! - `walk`: cycle-safe schema graph traversal
//! - `refcount`: per-node reference counts
//! - `surface`: baseline, stripping, exclusion and collection
//! - `apply`: write-back onto the raw YAML tree

mod apply;
pub(crate) mod helpers;
mod refcount;
mod surface;
mod walk;

use serde_yaml_ng::Value;

use crate::config::ProjectConfig;
use crate::error;
use crate::model::{Document, Parameter, ParameterLocation};

pub use apply::apply_report;
pub use refcount::RefCounts;
pub use surface::{baseline_counts, prune, PruneReport, StrippedParameter};
pub use walk::{reachable, walk, Graph};

/// Which paths to exclude and which path parameters to strip.
///
/// Construct with [`PruneConfig::new`] and configure via
/// [`with_project_config`](Self::with_project_config) (file-based) or the
/// builder methods (programmatic).
///
/// # Example
///
/// ```
/// use openapi_prune::PruneConfig;
///
/// let config = PruneConfig::new()
///     .exclude_path_prefixes(&["/api/content"])
///     .strip_path_parameters(&["app"]);
///
/// assert!(config.excludes("/API/Content/blog"));
/// assert!(!config.excludes("/api/apps"));
/// ```
#[derive(Debug, Clone)]
pub struct PruneConfig {
    /// Paths starting with any of these are removed.
    exclude_path_prefixes: Vec<String>,

    /// `in: path` parameters with any of these names are removed.
    strip_path_parameters: Vec<String>,

    /// Compare path prefixes ignoring ASCII case.
    case_insensitive: bool,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PruneConfig {
    /// A config that prunes nothing, with case-insensitive prefix matching.
    #[must_use]
    pub fn new() -> Self {
        Self {
            exclude_path_prefixes: Vec::new(),
            strip_path_parameters: Vec::new(),
            case_insensitive: true,
        }
    }

    /// Apply settings from a [`ProjectConfig`].
    ///
    /// Builder methods called after this override config values.
    #[must_use]
    pub fn with_project_config(mut self, project: &ProjectConfig) -> Self {
        self.exclude_path_prefixes
            .clone_from(&project.exclude_path_prefixes);
        self.strip_path_parameters
            .clone_from(&project.strip_path_parameters);
        self.case_insensitive = project.case_insensitive;
        self
    }

    /// Set the path prefixes to exclude.
    #[must_use]
    pub fn exclude_path_prefixes(mut self, prefixes: &[&str]) -> Self {
        self.exclude_path_prefixes = prefixes.iter().map(ToString::to_string).collect();
        self
    }

    /// Set the names of path parameters to strip from every operation.
    #[must_use]
    pub fn strip_path_parameters(mut self, names: &[&str]) -> Self {
        self.strip_path_parameters = names.iter().map(ToString::to_string).collect();
        self
    }

    /// Match path prefixes ignoring ASCII case (the default) or exactly.
    #[must_use]
    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.case_insensitive = enabled;
        self
    }

    /// `true` if `path` falls under one of the excluded prefixes.
    #[must_use]
    pub fn excludes(&self, path: &str) -> bool {
        self.exclude_path_prefixes.iter().any(|prefix| {
            let Some(head) = path.get(..prefix.len()) else {
                return false;
            };
            if self.case_insensitive {
                head.eq_ignore_ascii_case(prefix)
            } else {
                head == prefix.as_str()
            }
        })
    }

    /// `true` if `param` is a path parameter the target surface supplies
    /// out of band.
    #[must_use]
    pub fn strips(&self, param: &Parameter) -> bool {
        param.location == ParameterLocation::Path
            && self.strip_path_parameters.iter().any(|n| *n == param.name)
    }
}

/// Prune a parsed document tree in place and return what was removed.
///
/// Every schema reference left in the tree still resolves: definitions the
/// pruner released but the remaining tree names elsewhere are kept.
///
/// # Errors
///
/// Returns an error if the tree is not a usable `OpenAPI` document or its
/// schema graph is malformed. The tree is left untouched in that case.
pub fn prune_document(doc: &mut Value, config: &PruneConfig) -> error::Result<PruneReport> {
    let mut document = Document::from_value(doc)?;
    let mut report = prune(
        &mut document,
        |path| Ok(config.excludes(path)),
        |param| Ok(config.strips(param)),
    )?;
    apply_report(doc, &mut report);
    Ok(report)
}

/// Prune an `OpenAPI` YAML (or JSON) document and return the pruned YAML.
///
/// # Errors
///
/// Returns an error if the input cannot be parsed, is not a usable `OpenAPI`
/// document, or its schema graph is malformed.
pub fn prune_yaml(input_yaml: &str, config: &PruneConfig) -> error::Result<String> {
    let mut doc: Value = serde_yaml_ng::from_str(input_yaml)?;
    prune_document(&mut doc, config)?;
    serde_yaml_ng::to_string(&doc).map_err(error::Error::from)
}

/// Prune an `OpenAPI` document and return it as pretty-printed JSON.
///
/// # Errors
///
/// Same as [`prune_yaml`], plus [`Error::Json`](error::Error::Json) if the
/// tree holds keys JSON cannot represent.
pub fn prune_json(input: &str, config: &PruneConfig) -> error::Result<String> {
    let mut doc: Value = serde_yaml_ng::from_str(input)?;
    prune_document(&mut doc, config)?;
    serde_json::to_string_pretty(&doc).map_err(error::Error::from)
}
