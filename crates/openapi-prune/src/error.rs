//! Typed error enum for the `openapi-prune` library API.
//!
//! Library consumers can match on specific variants. The CLI (`main.rs`)
//! converts these to `anyhow::Error` at the binary boundary for richer
//! context messages.

use crate::model::SchemaId;

/// Errors produced by `openapi-prune` library operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// File I/O failure (reading config or document files).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error(transparent)]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization failure.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The input is not shaped like an `OpenAPI` document.
    #[error("invalid OpenAPI document: {reason}")]
    InvalidDocument {
        /// What was wrong with the input.
        reason: String,
    },

    /// A `$ref` that does not point into the local schema definitions.
    ///
    /// Only `#/components/schemas/<Name>` and `#/definitions/<Name>` are
    /// understood; external files and other component kinds are not.
    #[error("unsupported schema reference '{reference}'")]
    UnsupportedReference {
        /// The raw `$ref` string.
        reference: String,
    },

    /// A schema reference names a definition absent from the definitions table.
    ///
    /// The pruned output would be invalid, so this is never recovered.
    #[error("schema reference '{name}' does not match any definition")]
    MalformedGraph {
        /// The unresolved definition name.
        name: String,
    },

    /// A schema handle points outside the document's schema arena.
    #[error("schema handle {id} is not part of this document")]
    DanglingSchema {
        /// The out-of-range handle.
        id: SchemaId,
    },

    /// A reference count would drop below zero.
    ///
    /// Means a schema was released more often than it was retained, which is
    /// a bookkeeping bug rather than a property of the input.
    #[error("reference count underflow for schema {schema}")]
    Consistency {
        /// The schema whose count was already exhausted.
        schema: SchemaId,
    },

    /// A caller-supplied exclusion or stripping predicate failed.
    #[error("predicate failed: {message}")]
    Predicate {
        /// Message supplied by the predicate.
        message: String,
    },
}

impl Error {
    /// Build a [`Error::Predicate`] from any displayable message.
    ///
    /// Intended for use inside the predicates passed to [`crate::prune()`].
    pub fn predicate(message: impl std::fmt::Display) -> Self {
        Self::Predicate {
            message: message.to_string(),
        }
    }
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;
