//! Per-node reference counts for one pruning pass.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::model::SchemaId;

/// Live reference counts keyed by schema identity.
///
/// Created fresh for each pruning pass. The table never drops entries on its
/// own; deciding what to delete is the pruner's job.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefCounts {
    counts: HashMap<SchemaId, i64>,
}

impl RefCounts {
    /// An empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one reference to `id` and return the new count.
    pub fn increment(&mut self, id: SchemaId) -> i64 {
        let count = self.counts.entry(id).or_insert(0);
        *count += 1;
        *count
    }

    /// Drop one reference from `id` and return the new count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Consistency`] if `id` holds no references, leaving the
    /// count untouched.
    pub fn decrement(&mut self, id: SchemaId) -> Result<i64> {
        let count = self.counts.entry(id).or_insert(0);
        if *count <= 0 {
            return Err(Error::Consistency { schema: id });
        }
        *count -= 1;
        Ok(*count)
    }

    /// Current count of `id` (zero if never seen).
    #[must_use]
    pub fn get(&self, id: SchemaId) -> i64 {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    /// Number of nodes the table has an entry for.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// `true` if no node has been counted yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Iterate over `(node, count)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (SchemaId, i64)> + '_ {
        self.counts.iter().map(|(id, count)| (*id, *count))
    }
}
