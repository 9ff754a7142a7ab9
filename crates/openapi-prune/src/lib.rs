#![allow(clippy::doc_markdown)] // README uses "OpenAPI" proper noun throughout
#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod load;
mod model;
mod prune;

pub use config::ProjectConfig;
pub use error::{Error, Result};
pub use load::REQUEST_BODY_PARAMETER;
pub use model::{
    Document, HttpMethod, Operation, Parameter, ParameterLocation, PathItem, Response, Schema,
    SchemaId,
};
pub use prune::{
    apply_report, baseline_counts, prune, prune_document, prune_json, prune_yaml, reachable, walk,
    Graph, PruneConfig, PruneReport, RefCounts, StrippedParameter,
};
