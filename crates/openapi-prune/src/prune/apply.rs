//! Apply a [`PruneReport`] to the raw document tree.
//!
//! The typed model only carries what reachability needs, so the removals are
//! replayed on the original YAML instead of re-serializing the model. Keys
//! the model never looked at (descriptions, examples, security, tags) come
//! out exactly as they went in.

use std::collections::HashSet;

use serde_yaml_ng::{Mapping, Value};
use tracing::debug;

use crate::load::REQUEST_BODY_PARAMETER;
use crate::model::ParameterLocation;

use super::helpers::{
    collect_schema_refs, definitions, definitions_mut, operation, operation_mut, path_item,
    path_item_mut, paths_mut, resolve_component,
};
use super::surface::{PruneReport, StrippedParameter};

/// Remove everything listed in `report` from `doc`.
///
/// A definition the remaining tree still names somewhere the model does not
/// cover (a header schema, a `not` branch, a discriminator mapping, a kept
/// definition nothing reaches) is kept and taken off
/// `report.removed_definitions`, so the written document never holds a
/// dangling schema reference.
///
/// Entries that are already gone are ignored, so applying the same report
/// twice is harmless.
pub fn apply_report(doc: &mut Value, report: &mut PruneReport) {
    for param in &report.stripped_parameters {
        strip_parameter(doc, param);
    }

    if let Some(paths) = paths_mut(doc) {
        for path in &report.removed_paths {
            paths.shift_remove(path.as_str());
        }
    }

    keep_referenced(doc, &mut report.removed_definitions);

    if let Some(defs) = definitions_mut(doc) {
        for name in &report.removed_definitions {
            defs.shift_remove(name.as_str());
        }
    }
}

/// Remove one parameter (or the `requestBody` it was synthesized from).
///
/// The operation's own list is searched first, then the path-level list.
/// Entries given as `$ref` match by the name and location they resolve to.
fn strip_parameter(doc: &mut Value, param: &StrippedParameter) {
    if param.location == ParameterLocation::Body
        && param.name == REQUEST_BODY_PARAMETER
        && operation_mut(doc, &param.path, param.method)
            .is_some_and(|op| op.shift_remove("requestBody").is_some())
    {
        return;
    }

    let own = operation(doc, &param.path, param.method).and_then(|op| op.get("parameters"));
    if let Some(index) = matching_index(doc, own, param) {
        if let Some(op) = operation_mut(doc, &param.path, param.method) {
            remove_parameter(op, index);
        }
        return;
    }

    let shared = path_item(doc, &param.path).and_then(|item| item.get("parameters"));
    if let Some(index) = matching_index(doc, shared, param) {
        if let Some(item) = path_item_mut(doc, &param.path) {
            remove_parameter(item, index);
        }
    }
}

fn matching_index(doc: &Value, params: Option<&Value>, param: &StrippedParameter) -> Option<usize> {
    params?.as_sequence()?.iter().position(|entry| {
        let Some(p) = resolve_component(doc, entry).and_then(Value::as_mapping) else {
            return false;
        };
        p.get("name").and_then(Value::as_str) == Some(param.name.as_str())
            && p.get("in").and_then(Value::as_str) == Some(param.location.as_str())
    })
}

/// Drop entry `index` of `owner.parameters`, and the list itself once empty.
fn remove_parameter(owner: &mut Mapping, index: usize) {
    let Some(params) = owner
        .get_mut("parameters")
        .and_then(Value::as_sequence_mut)
    else {
        return;
    };
    params.remove(index);
    if params.is_empty() {
        owner.shift_remove("parameters");
    }
}

/// Take every definition still named by the rest of the tree off `removed`.
///
/// Roots are all references outside the definitions table plus those of the
/// definitions that stay; a kept candidate keeps whatever it refers to.
fn keep_referenced(doc: &Value, removed: &mut Vec<String>) {
    if removed.is_empty() {
        return;
    }
    let Some(defs) = definitions(doc) else {
        return;
    };
    let candidates: HashSet<&str> = removed.iter().map(String::as_str).collect();

    let mut roots = HashSet::new();
    collect_outside_definitions(doc, &mut roots);
    for (key, schema) in defs {
        if key.as_str().is_some_and(|name| !candidates.contains(name)) {
            collect_schema_refs(schema, &mut roots);
        }
    }

    let mut live = HashSet::new();
    let mut stack: Vec<String> = roots.into_iter().collect();
    while let Some(name) = stack.pop() {
        if !candidates.contains(name.as_str()) || live.contains(&name) {
            continue;
        }
        if let Some(schema) = defs.get(name.as_str()) {
            let mut next = HashSet::new();
            collect_schema_refs(schema, &mut next);
            stack.extend(next);
        }
        live.insert(name);
    }

    if live.is_empty() {
        return;
    }
    removed.retain(|name| {
        let keep = live.contains(name);
        if keep {
            debug!(definition = %name, "keeping definition still referenced");
        }
        !keep
    });
}

/// Collect schema references from everything but the definitions table.
fn collect_outside_definitions(doc: &Value, names: &mut HashSet<String>) {
    let Some(root) = doc.as_mapping() else {
        return;
    };
    for (key, value) in root {
        match key.as_str() {
            Some("definitions") => {}
            Some("components") => {
                let sections = value.as_mapping().into_iter().flatten();
                for (section, content) in sections {
                    if section.as_str() != Some("schemas") {
                        collect_schema_refs(content, names);
                    }
                }
            }
            _ => collect_schema_refs(value, names),
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;
    use crate::model::HttpMethod;

    fn parse(yaml: &str) -> Value {
        serde_yaml_ng::from_str(yaml).unwrap()
    }

    #[test]
    fn removes_paths_and_definitions_keeping_the_rest() {
        let mut doc = parse(indoc! {r"
            openapi: 3.0.3
            info:
              title: Demo
            paths:
              /keep:
                get:
                  summary: kept
              /drop:
                get: {}
            components:
              schemas:
                Kept:
                  description: stays
                Dropped: {}
        "});

        apply_report(
            &mut doc,
            &mut PruneReport {
                removed_paths: vec!["/drop".to_string()],
                stripped_parameters: Vec::new(),
                removed_definitions: vec!["Dropped".to_string()],
            },
        );

        let paths = doc["paths"].as_mapping().unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(doc["paths"]["/keep"]["get"]["summary"].as_str(), Some("kept"));
        let schemas = doc["components"]["schemas"].as_mapping().unwrap();
        assert!(schemas.contains_key("Kept"));
        assert!(!schemas.contains_key("Dropped"));
        assert_eq!(doc["info"]["title"].as_str(), Some("Demo"));
    }

    #[test]
    fn strips_only_the_matching_parameter() {
        let mut doc = parse(indoc! {r"
            paths:
              /apps/{app}/items:
                get:
                  parameters:
                    - name: app
                      in: path
                    - name: app
                      in: query
                    - name: page
                      in: query
        "});

        apply_report(
            &mut doc,
            &mut PruneReport {
                stripped_parameters: vec![StrippedParameter {
                    path: "/apps/{app}/items".to_string(),
                    method: HttpMethod::Get,
                    name: "app".to_string(),
                    location: ParameterLocation::Path,
                }],
                ..PruneReport::default()
            },
        );

        let params = doc["paths"]["/apps/{app}/items"]["get"]["parameters"]
            .as_sequence()
            .unwrap();
        assert_eq!(params.len(), 2);
        assert!(params.iter().all(|p| p["in"].as_str() == Some("query")));
    }

    #[test]
    fn last_parameter_removes_the_list() {
        let mut doc = parse(indoc! {r"
            paths:
              /apps/{app}:
                delete:
                  parameters:
                    - name: app
                      in: path
        "});

        apply_report(
            &mut doc,
            &mut PruneReport {
                stripped_parameters: vec![StrippedParameter {
                    path: "/apps/{app}".to_string(),
                    method: HttpMethod::Delete,
                    name: "app".to_string(),
                    location: ParameterLocation::Path,
                }],
                ..PruneReport::default()
            },
        );

        let op = doc["paths"]["/apps/{app}"]["delete"].as_mapping().unwrap();
        assert!(!op.contains_key("parameters"));
    }

    #[test]
    fn stripped_body_removes_request_body() {
        let mut doc = parse(indoc! {r"
            paths:
              /things:
                post:
                  requestBody:
                    content:
                      application/json:
                        schema:
                          type: object
        "});

        apply_report(
            &mut doc,
            &mut PruneReport {
                stripped_parameters: vec![StrippedParameter {
                    path: "/things".to_string(),
                    method: HttpMethod::Post,
                    name: REQUEST_BODY_PARAMETER.to_string(),
                    location: ParameterLocation::Body,
                }],
                ..PruneReport::default()
            },
        );

        let op = doc["paths"]["/things"]["post"].as_mapping().unwrap();
        assert!(!op.contains_key("requestBody"));
    }

    #[test]
    fn missing_targets_are_ignored() {
        let mut doc = parse("paths: {}\n");
        let mut report = PruneReport {
            removed_paths: vec!["/nowhere".to_string()],
            stripped_parameters: vec![StrippedParameter {
                path: "/nowhere".to_string(),
                method: HttpMethod::Get,
                name: "app".to_string(),
                location: ParameterLocation::Path,
            }],
            removed_definitions: vec!["Nothing".to_string()],
        };

        apply_report(&mut doc, &mut report);
        apply_report(&mut doc, &mut report);
        assert!(doc["paths"].as_mapping().unwrap().is_empty());
    }

    fn strip(path: &str, method: HttpMethod, name: &str) -> PruneReport {
        PruneReport {
            stripped_parameters: vec![StrippedParameter {
                path: path.to_string(),
                method,
                name: name.to_string(),
                location: ParameterLocation::Path,
            }],
            ..PruneReport::default()
        }
    }

    #[test]
    fn strips_component_parameter_references() {
        let mut doc = parse(indoc! {r"
            paths:
              /apps/{app}/items:
                get:
                  parameters:
                    - $ref: '#/components/parameters/Page'
                    - $ref: '#/components/parameters/App'
            components:
              parameters:
                App:
                  name: app
                  in: path
                Page:
                  name: page
                  in: query
        "});

        apply_report(&mut doc, &mut strip("/apps/{app}/items", HttpMethod::Get, "app"));

        let params = doc["paths"]["/apps/{app}/items"]["get"]["parameters"]
            .as_sequence()
            .unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(
            params[0]["$ref"].as_str(),
            Some("#/components/parameters/Page")
        );
    }

    #[test]
    fn strips_path_level_parameters() {
        let mut doc = parse(indoc! {r"
            paths:
              /apps/{app}:
                parameters:
                  - name: app
                    in: path
                get:
                  summary: read
                put:
                  summary: write
        "});

        let mut report = strip("/apps/{app}", HttpMethod::Get, "app");
        report
            .stripped_parameters
            .extend(strip("/apps/{app}", HttpMethod::Put, "app").stripped_parameters);
        apply_report(&mut doc, &mut report);

        let item = doc["paths"]["/apps/{app}"].as_mapping().unwrap();
        assert!(!item.contains_key("parameters"));
        assert_eq!(doc["paths"]["/apps/{app}"]["put"]["summary"].as_str(), Some("write"));
    }

    #[test]
    fn operation_override_is_stripped_before_the_shared_one() {
        let mut doc = parse(indoc! {r"
            paths:
              /apps/{app}:
                parameters:
                  - name: app
                    in: path
                get:
                  parameters:
                    - name: app
                      in: path
                      description: own
        "});

        apply_report(&mut doc, &mut strip("/apps/{app}", HttpMethod::Get, "app"));

        let item = doc["paths"]["/apps/{app}"].as_mapping().unwrap();
        assert!(item.contains_key("parameters"));
        assert!(!doc["paths"]["/apps/{app}"]["get"]
            .as_mapping()
            .unwrap()
            .contains_key("parameters"));
    }

    #[test]
    fn definitions_still_referenced_are_kept() {
        let mut doc = parse(indoc! {r"
            paths:
              /kept:
                get:
                  responses:
                    '200':
                      headers:
                        X-Page:
                          schema:
                            $ref: '#/components/schemas/PageHeader'
            components:
              responses:
                Error:
                  content:
                    application/json:
                      schema:
                        $ref: '#/components/schemas/ErrorDto'
              schemas:
                PageHeader: {}
                ErrorDto:
                  properties:
                    detail:
                      $ref: '#/components/schemas/Detail'
                Detail: {}
                Orphan:
                  not:
                    $ref: '#/components/schemas/Negated'
                Negated: {}
                Gone: {}
        "});
        let mut report = PruneReport {
            removed_definitions: ["PageHeader", "ErrorDto", "Detail", "Negated", "Gone"]
                .map(String::from)
                .to_vec(),
            ..PruneReport::default()
        };

        apply_report(&mut doc, &mut report);

        assert_eq!(report.removed_definitions, vec!["Gone"]);
        let schemas = doc["components"]["schemas"].as_mapping().unwrap();
        assert_eq!(schemas.len(), 5);
        assert!(!schemas.contains_key("Gone"));
    }

    #[test]
    fn removed_definitions_referring_to_each_other_still_go() {
        let mut doc = parse(indoc! {r"
            definitions:
              Node:
                properties:
                  parent:
                    $ref: '#/definitions/Parent'
              Parent:
                allOf:
                  - $ref: '#/definitions/Node'
        "});
        let mut report = PruneReport {
            removed_definitions: vec!["Node".to_string(), "Parent".to_string()],
            ..PruneReport::default()
        };

        apply_report(&mut doc, &mut report);

        assert_eq!(report.removed_definitions.len(), 2);
        assert!(doc["definitions"].as_mapping().unwrap().is_empty());
    }
}
