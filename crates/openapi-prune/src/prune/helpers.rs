//! Shared YAML navigation helpers used by the loader and the write-back step.

use std::collections::HashSet;

use serde_yaml_ng::{Mapping, Value};

use crate::error::{Error, Result};
use crate::model::HttpMethod;

/// `$ref` prefix of a named schema in `OpenAPI` 3.x.
pub const COMPONENTS_SCHEMA_PREFIX: &str = "#/components/schemas/";

/// `$ref` prefix of a named schema in Swagger 2.0.
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Named schemas of the document: `components.schemas` (3.x) or `definitions` (2.0).
pub fn definitions(doc: &Value) -> Option<&Mapping> {
    let root = doc.as_mapping()?;
    root.get("components")
        .and_then(Value::as_mapping)
        .and_then(|m| m.get("schemas"))
        .or_else(|| root.get("definitions"))
        .and_then(Value::as_mapping)
}

/// Mutable counterpart of [`definitions`].
pub fn definitions_mut(doc: &mut Value) -> Option<&mut Mapping> {
    let root = doc.as_mapping_mut()?;
    if root
        .get("components")
        .and_then(Value::as_mapping)
        .is_some_and(|c| c.contains_key("schemas"))
    {
        return root
            .get_mut("components")
            .and_then(Value::as_mapping_mut)
            .and_then(|m| m.get_mut("schemas"))
            .and_then(Value::as_mapping_mut);
    }
    root.get_mut("definitions").and_then(Value::as_mapping_mut)
}

/// The `paths` object, if present.
pub fn paths_mut(doc: &mut Value) -> Option<&mut Mapping> {
    doc.as_mapping_mut()
        .and_then(|m| m.get_mut("paths"))
        .and_then(Value::as_mapping_mut)
}

/// The path item at `paths[path]`.
pub fn path_item<'a>(doc: &'a Value, path: &str) -> Option<&'a Mapping> {
    doc.as_mapping()?
        .get("paths")
        .and_then(Value::as_mapping)?
        .get(path)
        .and_then(Value::as_mapping)
}

/// Mutable counterpart of [`path_item`].
pub fn path_item_mut<'a>(doc: &'a mut Value, path: &str) -> Option<&'a mut Mapping> {
    paths_mut(doc)?.get_mut(path).and_then(Value::as_mapping_mut)
}

/// The operation object at `paths[path][method]`.
pub fn operation<'a>(doc: &'a Value, path: &str, method: HttpMethod) -> Option<&'a Mapping> {
    path_item(doc, path)?
        .get(method.as_str())
        .and_then(Value::as_mapping)
}

/// Mutable counterpart of [`operation`].
pub fn operation_mut<'a>(
    doc: &'a mut Value,
    path: &str,
    method: HttpMethod,
) -> Option<&'a mut Mapping> {
    path_item_mut(doc, path)?
        .get_mut(method.as_str())
        .and_then(Value::as_mapping_mut)
}

/// Schemas of every media type in a `content` object (`OpenAPI` 3.x).
pub fn media_schemas(content: &Mapping) -> impl Iterator<Item = &Value> {
    content
        .values()
        .filter_map(|media| media.as_mapping().and_then(|m| m.get("schema")))
}

/// Follow local `$ref`s to reusable components (`#/components/parameters/App`,
/// `#/responses/NotFound`, ...) until reaching the object itself.
///
/// Values without a `$ref` are returned as is. Returns `None` for external,
/// missing or circular references.
pub fn resolve_component<'a>(doc: &'a Value, value: &'a Value) -> Option<&'a Value> {
    let mut current = value;
    let mut seen = HashSet::new();
    while let Some(reference) = current.get("$ref").and_then(Value::as_str) {
        if !seen.insert(reference) {
            return None;
        }
        current = pointer(doc, reference)?;
    }
    Some(current)
}

/// Look up a local JSON Pointer reference (`#/a/b~1c`).
fn pointer<'a>(doc: &'a Value, reference: &str) -> Option<&'a Value> {
    let path = reference.strip_prefix("#/")?;
    path.split('/').try_fold(doc, |node, segment| {
        let key = segment.replace("~1", "/").replace("~0", "~");
        node.as_mapping()?.get(key.as_str())
    })
}

/// Definition name targeted by a local schema `$ref`.
///
/// JSON Pointer escapes (`~1` for `/`, `~0` for `~`) are decoded.
///
/// # Errors
///
/// Returns [`Error::UnsupportedReference`] for external or non-schema refs.
pub fn ref_name(reference: &str) -> Result<String> {
    let name = reference
        .strip_prefix(COMPONENTS_SCHEMA_PREFIX)
        .or_else(|| reference.strip_prefix(DEFINITIONS_PREFIX))
        .filter(|name| !name.is_empty() && !name.contains('/'))
        .ok_or_else(|| Error::UnsupportedReference {
            reference: reference.to_string(),
        })?;
    Ok(name.replace("~1", "/").replace("~0", "~"))
}

/// Recursively walk a YAML value tree and collect every definition it names,
/// through `$ref` or a discriminator mapping.
pub fn collect_schema_refs(value: &Value, names: &mut HashSet<String>) {
    match value {
        Value::Mapping(map) => {
            for (k, v) in map {
                match k.as_str() {
                    Some("$ref") => {
                        if let Some(name) = v.as_str().and_then(|s| ref_name(s).ok()) {
                            names.insert(name);
                        }
                    }
                    Some("discriminator") => {
                        let targets = v
                            .get("mapping")
                            .and_then(Value::as_mapping)
                            .into_iter()
                            .flat_map(Mapping::values)
                            .filter_map(Value::as_str);
                        names.extend(targets.filter_map(|s| ref_name(s).ok()));
                    }
                    _ => {}
                }
                collect_schema_refs(v, names);
            }
        }
        Value::Sequence(seq) => {
            for item in seq {
                collect_schema_refs(item, names);
            }
        }
        Value::Tagged(tagged) => collect_schema_refs(&tagged.value, names),
        _ => {}
    }
}

/// Render a mapping key (status codes are often unquoted integers) as a string.
pub fn key_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
