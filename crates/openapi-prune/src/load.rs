//! Build a [`Document`] from a parsed `OpenAPI` (3.x) or Swagger (2.0) tree.
//!
//! Only the parts that take part in reachability are modelled: operations,
//! their parameters (path-level ones included), request bodies and
//! responses, and the schema edges the walker follows. Parameters, request
//! bodies and responses given as `$ref` to reusable components are resolved
//! and loaded like inline ones. Everything else stays in the raw tree and is
//! carried through untouched by the write-back step.

use serde_yaml_ng::{Mapping, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{
    Document, HttpMethod, Operation, Parameter, ParameterLocation, Response, Schema, SchemaId,
};
use crate::prune::helpers::{definitions, key_string, media_schemas, ref_name, resolve_component};

/// Name given to the body parameter synthesized from a 3.x `requestBody`.
pub const REQUEST_BODY_PARAMETER: &str = "body";

impl Document {
    /// Build a document from a parsed YAML or JSON tree.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDocument`] if the root, `paths`, or a path item is
    ///   not a mapping.
    /// - [`Error::UnsupportedReference`] for a schema `$ref` that does not
    ///   point into the local definitions.
    pub fn from_value(value: &Value) -> Result<Self> {
        let root = value.as_mapping().ok_or_else(|| Error::InvalidDocument {
            reason: "document root is not a mapping".to_string(),
        })?;

        let mut doc = Self::new();

        if let Some(defs) = definitions(value) {
            for (key, schema) in defs {
                let Some(name) = key.as_str() else {
                    continue;
                };
                let id = doc.load_schema(schema)?;
                doc.definitions.insert(name.to_string(), id);
            }
        }

        let Some(paths) = root.get("paths") else {
            return Ok(doc);
        };
        let paths = paths.as_mapping().ok_or_else(|| Error::InvalidDocument {
            reason: "`paths` is not a mapping".to_string(),
        })?;

        for (path_key, path_item) in paths {
            let Some(path) = path_key.as_str() else {
                continue;
            };
            let item = path_item
                .as_mapping()
                .ok_or_else(|| Error::InvalidDocument {
                    reason: format!("path item '{path}' is not a mapping"),
                })?;

            for (method_key, operation) in item {
                let Some(method) = method_key.as_str().and_then(HttpMethod::from_key) else {
                    continue;
                };
                let Some(op_map) = operation.as_mapping() else {
                    continue;
                };
                let op = doc.load_operation(value, item.get("parameters"), op_map)?;
                doc.add_operation(path, method, op);
            }
        }

        debug!(
            paths = doc.paths.len(),
            definitions = doc.definitions.len(),
            schemas = doc.schemas.len(),
            "document loaded"
        );
        Ok(doc)
    }

    /// Parse YAML (or JSON, which is valid YAML) text into a document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Yaml`] for unparseable input, otherwise the same as
    /// [`Document::from_value`].
    pub fn from_yaml(input: &str) -> Result<Self> {
        let value: Value = serde_yaml_ng::from_str(input)?;
        Self::from_value(&value)
    }

    /// Load one operation. Path-level parameters apply unless the operation
    /// redeclares the same name and location.
    fn load_operation(
        &mut self,
        root: &Value,
        shared_params: Option<&Value>,
        op_map: &Mapping,
    ) -> Result<Operation> {
        let own = self.load_parameters(root, op_map.get("parameters"))?;
        let mut parameters = self.load_parameters(root, shared_params)?;
        parameters.retain(|p| {
            !own.iter()
                .any(|o| o.name == p.name && o.location == p.location)
        });
        parameters.extend(own);

        let mut op = Operation {
            operation_id: op_map
                .get("operationId")
                .and_then(Value::as_str)
                .map(str::to_string),
            parameters,
            ..Operation::default()
        };

        if let Some(body) = op_map.get("requestBody") {
            match resolve_component(root, body)
                .and_then(|rb| rb.get("content"))
                .and_then(Value::as_mapping)
            {
                Some(content) => {
                    let schema = self.load_content(content)?;
                    op.parameters.push(Parameter::new(
                        REQUEST_BODY_PARAMETER,
                        ParameterLocation::Body,
                        schema,
                    ));
                }
                None => debug!(reference = ?body.get("$ref"), "request body without content"),
            }
        }

        if let Some(responses) = op_map.get("responses").and_then(Value::as_mapping) {
            for (code_key, response) in responses {
                let Some(code) = key_string(code_key) else {
                    continue;
                };
                let Some(resp) = resolve_component(root, response).and_then(Value::as_mapping)
                else {
                    debug!(
                        %code,
                        reference = ?response.get("$ref"),
                        "skipping unresolvable response"
                    );
                    op.responses.insert(code, Response { schema: None });
                    continue;
                };
                let schema = match resp.get("schema") {
                    Some(schema) => Some(self.load_schema(schema)?),
                    None => self.load_optional_content(resp)?,
                };
                op.responses.insert(code, Response { schema });
            }
        }

        Ok(op)
    }

    fn load_parameters(&mut self, root: &Value, params: Option<&Value>) -> Result<Vec<Parameter>> {
        let Some(params) = params.and_then(Value::as_sequence) else {
            return Ok(Vec::new());
        };

        let mut loaded = Vec::with_capacity(params.len());
        for entry in params {
            let Some(param) = resolve_component(root, entry).and_then(Value::as_mapping) else {
                debug!(reference = ?entry.get("$ref"), "skipping unresolvable parameter");
                continue;
            };
            let (Some(name), Some(location)) = (
                param.get("name").and_then(Value::as_str),
                param
                    .get("in")
                    .and_then(Value::as_str)
                    .and_then(ParameterLocation::from_key),
            ) else {
                continue;
            };
            let schema = match param.get("schema") {
                Some(schema) => Some(self.load_schema(schema)?),
                None => self.load_optional_content(param)?,
            };
            loaded.push(Parameter::new(name, location, schema));
        }
        Ok(loaded)
    }

    fn load_optional_content(&mut self, owner: &Mapping) -> Result<Option<SchemaId>> {
        match owner.get("content").and_then(Value::as_mapping) {
            Some(content) => self.load_content(content),
            None => Ok(None),
        }
    }

    /// Load the schemas of every media type. Several distinct media types
    /// are joined under an `anyOf` node so one walk covers all of them.
    fn load_content(&mut self, content: &Mapping) -> Result<Option<SchemaId>> {
        let mut roots = media_schemas(content)
            .map(|schema| self.load_schema(schema))
            .collect::<Result<Vec<_>>>()?;

        Ok(match roots.len() {
            0 => None,
            1 => roots.pop(),
            _ => Some(self.add_schema(Schema {
                any_of: roots,
                ..Schema::default()
            })),
        })
    }

    /// Add a schema tree to the arena, children first, and return its root.
    fn load_schema(&mut self, value: &Value) -> Result<SchemaId> {
        let Some(map) = value.as_mapping() else {
            // `true` / `false` schemas (3.1) and malformed entries are leaves.
            return Ok(self.add_schema(Schema::leaf()));
        };

        let mut schema = Schema::leaf();

        if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
            schema.reference = Some(ref_name(reference)?);
        }
        if let Some(item) = map.get("items").filter(|v| v.is_mapping()) {
            schema.item = Some(self.load_schema(item)?);
        }
        schema.one_of = self.load_branches(map.get("oneOf"))?;
        schema.all_of = self.load_branches(map.get("allOf"))?;
        schema.any_of = self.load_branches(map.get("anyOf"))?;

        if let Some(props) = map.get("properties").and_then(Value::as_mapping) {
            for (key, prop) in props {
                let Some(name) = key.as_str() else {
                    continue;
                };
                let id = self.load_schema(prop)?;
                schema.properties.insert(name.to_string(), id);
            }
        }
        if let Some(extra) = map.get("additionalProperties").filter(|v| v.is_mapping()) {
            schema.additional_properties = Some(self.load_schema(extra)?);
        }

        Ok(self.add_schema(schema))
    }

    fn load_branches(&mut self, value: Option<&Value>) -> Result<Vec<SchemaId>> {
        let Some(branches) = value.and_then(Value::as_sequence) else {
            return Ok(Vec::new());
        };
        branches.iter().map(|b| self.load_schema(b)).collect()
    }
}
