//! Cycle-safe traversal of the schema graph.
//!
//! A walk starts at one root and visits every node reachable through item,
//! reference, composition, property and `additionalProperties` edges. Each
//! distinct node is visited at most once per walk, however many paths lead to
//! it, so self-referential definitions terminate and are counted once.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::model::{Schema, SchemaId};

/// Read-only view of a schema arena plus the definitions table its
/// references resolve against.
#[derive(Debug, Clone, Copy)]
pub struct Graph<'a> {
    schemas: &'a [Schema],
    definitions: &'a IndexMap<String, SchemaId>,
}

impl<'a> Graph<'a> {
    /// Build a view over an arena and a definitions table.
    #[must_use]
    pub fn new(schemas: &'a [Schema], definitions: &'a IndexMap<String, SchemaId>) -> Self {
        Self {
            schemas,
            definitions,
        }
    }

    /// Fetch a node, failing on handles from another document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DanglingSchema`] if `id` is outside the arena.
    pub fn node(&self, id: SchemaId) -> Result<&'a Schema> {
        self.schemas
            .get(id.index())
            .ok_or(Error::DanglingSchema { id })
    }

    /// Resolve a definition name to its root node.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedGraph`] if no definition has that name.
    pub fn resolve(&self, name: &str) -> Result<SchemaId> {
        self.definitions
            .get(name)
            .copied()
            .ok_or_else(|| Error::MalformedGraph {
                name: name.to_string(),
            })
    }
}

/// Visit `root` and every node reachable from it, each exactly once.
///
/// The visitor is called in depth-first pre-order. A `None` root is a no-op.
/// The traversal uses an explicit stack, so deeply nested schemas cannot
/// exhaust the call stack.
///
/// # Errors
///
/// Stops at the first error from the visitor, a reference to a missing
/// definition ([`Error::MalformedGraph`]) or a dangling handle
/// ([`Error::DanglingSchema`]).
pub fn walk<F>(graph: &Graph<'_>, root: Option<SchemaId>, mut visit: F) -> Result<()>
where
    F: FnMut(SchemaId) -> Result<()>,
{
    let Some(root) = root else {
        return Ok(());
    };

    let mut visited = HashSet::new();
    let mut stack = vec![root];

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }

        let node = graph.node(id)?;
        visit(id)?;

        // Pushed in reverse so the first edge is popped first.
        let target = node
            .reference
            .as_deref()
            .map(|name| graph.resolve(name))
            .transpose()?;
        let mut next: Vec<SchemaId> = node.item.into_iter().chain(target).collect();
        next.extend(node.children().skip(usize::from(node.item.is_some())));

        stack.extend(next.into_iter().rev().filter(|n| !visited.contains(n)));
    }

    Ok(())
}

/// Collect the nodes reachable from `root` in visit order.
///
/// # Errors
///
/// Same as [`walk`].
pub fn reachable(graph: &Graph<'_>, root: Option<SchemaId>) -> Result<Vec<SchemaId>> {
    let mut seen = Vec::new();
    walk(graph, root, |id| {
        seen.push(id);
        Ok(())
    })?;
    Ok(seen)
}
