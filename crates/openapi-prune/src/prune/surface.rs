//! Surface pruning: drop excluded paths and stripped parameters, then
//! garbage-collect definitions nothing live refers to any more.
//!
//! The pass works in four steps:
//!
//! 1. **Baseline**: every schema reachable from every parameter and response
//!    of every operation is retained once per walk.
//! 2. **Stripping**: parameters matching the strip predicate are removed from
//!    their operation and their schema is released.
//! 3. **Exclusion**: paths matching the exclusion predicate are removed and
//!    every schema of their remaining operations is released.
//! 4. **Collection**: after each release walk, named definitions visited by
//!    that walk whose count dropped to zero are deleted.
//!
//! A release walk covers the whole reachable set in one go, so definitions
//! only reachable through a deleted one are released in the same walk rather
//! than in a second cascade.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{Document, HttpMethod, Operation, Parameter, ParameterLocation, SchemaId};

use super::refcount::RefCounts;
use super::walk::{walk, Graph};

/// What a pruning pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    /// Paths removed by the exclusion predicate, in document order.
    pub removed_paths: Vec<String>,
    /// Parameters removed by the strip predicate.
    pub stripped_parameters: Vec<StrippedParameter>,
    /// Definitions deleted because nothing live refers to them.
    pub removed_definitions: Vec<String>,
}

impl PruneReport {
    /// `true` if the pass left the document untouched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.removed_paths.is_empty()
            && self.stripped_parameters.is_empty()
            && self.removed_definitions.is_empty()
    }
}

/// A parameter removed from a surviving or excluded operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedParameter {
    /// Path of the owning operation.
    pub path: String,
    /// Method of the owning operation.
    pub method: HttpMethod,
    /// Parameter name.
    pub name: String,
    /// Parameter location.
    pub location: ParameterLocation,
}

/// Reference counts of a document before any pruning.
///
/// # Errors
///
/// Returns [`Error::MalformedGraph`](crate::Error::MalformedGraph) if any
/// operation reaches a reference to a missing definition.
pub fn baseline_counts(document: &Document) -> Result<RefCounts> {
    let mut counts = RefCounts::new();
    retain_surface(&document.graph(), document, &mut counts)?;
    Ok(counts)
}

/// Prune a document in place.
///
/// `should_exclude` is asked once per path; `should_strip` once per
/// parameter of every operation. Errors from either are returned unchanged.
/// On error the document may be partially pruned and should be discarded.
///
/// Stripped parameters release their schema like an excluded operation does,
/// so a definition used only by stripped parameters is deleted too.
///
/// References resolve against the definitions table as it was when the pass
/// started, so deleting a definition never breaks a later walk through it.
///
/// # Errors
///
/// - [`Error::MalformedGraph`](crate::Error::MalformedGraph) for a reference
///   to a missing definition.
/// - [`Error::Consistency`](crate::Error::Consistency) if a schema is released
///   more often than it was retained.
/// - Whatever the predicates return.
pub fn prune<X, S>(
    document: &mut Document,
    mut should_exclude: X,
    mut should_strip: S,
) -> Result<PruneReport>
where
    X: FnMut(&str) -> Result<bool>,
    S: FnMut(&Parameter) -> Result<bool>,
{
    let snapshot = document.definitions.clone();
    let graph = Graph::new(&document.schemas, &snapshot);
    let mut counts = RefCounts::new();
    let mut report = PruneReport::default();

    retain_surface(&graph, document, &mut counts)?;
    debug!(nodes = counts.len(), "baseline reference counts established");

    for (path, item) in &mut document.paths {
        for (method, op) in &mut item.operations {
            let mut index = 0;
            while index < op.parameters.len() {
                if !should_strip(&op.parameters[index])? {
                    index += 1;
                    continue;
                }

                let param = op.parameters.remove(index);
                debug!(
                    %path,
                    %method,
                    name = %param.name,
                    location = %param.location,
                    "stripping parameter"
                );
                release(
                    &graph,
                    &mut counts,
                    &mut document.definitions,
                    param.schema,
                    &mut report.removed_definitions,
                )?;
                report.stripped_parameters.push(StrippedParameter {
                    path: path.clone(),
                    method: *method,
                    name: param.name,
                    location: param.location,
                });
            }
        }
    }

    let paths: Vec<String> = document.paths.keys().cloned().collect();
    for path in paths {
        if !should_exclude(&path)? {
            continue;
        }
        let Some(item) = document.paths.shift_remove(&path) else {
            continue;
        };
        debug!(%path, operations = item.operations.len(), "excluding path");

        for op in item.operations.values() {
            for root in op.schema_roots() {
                release(
                    &graph,
                    &mut counts,
                    &mut document.definitions,
                    root,
                    &mut report.removed_definitions,
                )?;
            }
        }
        report.removed_paths.push(path);
    }

    info!(
        paths = report.removed_paths.len(),
        parameters = report.stripped_parameters.len(),
        definitions = report.removed_definitions.len(),
        "pruning complete"
    );
    Ok(report)
}

/// Retain every schema of every operation in the document.
fn retain_surface(graph: &Graph<'_>, document: &Document, counts: &mut RefCounts) -> Result<()> {
    for (_, _, op) in document.operations() {
        retain_operation(graph, op, counts)?;
    }
    Ok(())
}

/// Retain the schemas of one operation, one walk per parameter and response.
fn retain_operation(graph: &Graph<'_>, op: &Operation, counts: &mut RefCounts) -> Result<()> {
    for root in op.schema_roots() {
        walk(graph, root, |id| {
            counts.increment(id);
            Ok(())
        })?;
    }
    Ok(())
}

/// Release everything reachable from `root`, then delete the definitions
/// this walk exhausted.
fn release(
    graph: &Graph<'_>,
    counts: &mut RefCounts,
    definitions: &mut IndexMap<String, SchemaId>,
    root: Option<SchemaId>,
    removed: &mut Vec<String>,
) -> Result<()> {
    let mut exhausted = HashSet::new();
    walk(graph, root, |id| {
        if counts.decrement(id)? <= 0 {
            exhausted.insert(id);
        }
        Ok(())
    })?;

    if exhausted.is_empty() {
        return Ok(());
    }

    definitions.retain(|name, id| {
        if exhausted.contains(id) {
            debug!(definition = %name, "removing unreferenced definition");
            removed.push(name.clone());
            false
        } else {
            true
        }
    });
    Ok(())
}
