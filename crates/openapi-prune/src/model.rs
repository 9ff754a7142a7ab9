//! In-memory document model consumed by the pruner.
//!
//! Schemas live in an arena owned by [`Document`] and are addressed by
//! [`SchemaId`]. Identity is the handle, not the content: two structurally
//! identical inline schemas are two distinct nodes with independent reference
//! counts. Named definitions map a name to the handle of their root node, and
//! a [`Schema::reference`] is only a lookup key into that table, so the graph
//! may freely contain cycles.

use std::fmt;

use indexmap::IndexMap;

/// Handle of a schema node inside a [`Document`]'s arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(usize);

impl SchemaId {
    /// Wrap a raw arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The raw arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node of the type-definition graph.
///
/// A single node may combine several shapes (an object with `allOf` branches,
/// for instance), which is why every edge kind is optional rather than the
/// node being an enum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Name of the definition this node refers to (`$ref`).
    pub reference: Option<String>,
    /// Element type of an array.
    pub item: Option<SchemaId>,
    /// `oneOf` branches, in document order.
    pub one_of: Vec<SchemaId>,
    /// `allOf` branches, in document order.
    pub all_of: Vec<SchemaId>,
    /// `anyOf` branches, in document order.
    pub any_of: Vec<SchemaId>,
    /// Named object properties.
    pub properties: IndexMap<String, SchemaId>,
    /// Value type of a map-like object.
    pub additional_properties: Option<SchemaId>,
}

impl Schema {
    /// A leaf schema with no outgoing edges (a primitive, typically).
    #[must_use]
    pub fn leaf() -> Self {
        Self::default()
    }

    /// A `$ref` to the named definition.
    #[must_use]
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            reference: Some(name.into()),
            ..Self::default()
        }
    }

    /// An array of `item`.
    #[must_use]
    pub fn array(item: SchemaId) -> Self {
        Self {
            item: Some(item),
            ..Self::default()
        }
    }

    /// An object with the given properties.
    #[must_use]
    pub fn object<K: Into<String>>(properties: impl IntoIterator<Item = (K, SchemaId)>) -> Self {
        Self {
            properties: properties
                .into_iter()
                .map(|(name, id)| (name.into(), id))
                .collect(),
            ..Self::default()
        }
    }

    /// A `oneOf` composition.
    #[must_use]
    pub fn one_of(branches: impl IntoIterator<Item = SchemaId>) -> Self {
        Self {
            one_of: branches.into_iter().collect(),
            ..Self::default()
        }
    }

    /// An `allOf` composition.
    #[must_use]
    pub fn all_of(branches: impl IntoIterator<Item = SchemaId>) -> Self {
        Self {
            all_of: branches.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Inline children in traversal order: item, `oneOf`, `allOf`, `anyOf`,
    /// properties, `additionalProperties`.
    ///
    /// The reference edge is not included; it needs the definitions table to
    /// resolve.
    pub fn children(&self) -> impl Iterator<Item = SchemaId> + '_ {
        self.item
            .into_iter()
            .chain(self.one_of.iter().copied())
            .chain(self.all_of.iter().copied())
            .chain(self.any_of.iter().copied())
            .chain(self.properties.values().copied())
            .chain(self.additional_properties)
    }

    /// `true` if the node has no outgoing edges at all.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.reference.is_none() && self.children().next().is_none()
    }
}

/// HTTP verbs an `OpenAPI` path item can hold operations for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `PUT`
    Put,
    /// `POST`
    Post,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// `HEAD`
    Head,
    /// `PATCH`
    Patch,
    /// `TRACE`
    Trace,
}

impl HttpMethod {
    /// All methods, in path item field order.
    pub const ALL: [Self; 8] = [
        Self::Get,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Options,
        Self::Head,
        Self::Patch,
        Self::Trace,
    ];

    /// Parse a path item key (`get`, `post`, ...). Case-sensitive, like the format.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == key)
    }

    /// Lowercase key as it appears in a path item.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterLocation {
    /// Templated path segment (`/apps/{app}`).
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
    /// Request body (`in: body` in 2.0, `requestBody` in 3.x).
    Body,
    /// Form field (2.0 only).
    FormData,
}

impl ParameterLocation {
    /// Parse the `in` field of a parameter object.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            "body" => Some(Self::Body),
            "formData" => Some(Self::FormData),
            _ => None,
        }
    }

    /// The `in` value as written in a document.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Body => "body",
            Self::FormData => "formData",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operation parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Where the parameter is carried.
    pub location: ParameterLocation,
    /// Schema of the parameter value, if it has one.
    pub schema: Option<SchemaId>,
}

impl Parameter {
    /// Build a parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, location: ParameterLocation, schema: Option<SchemaId>) -> Self {
        Self {
            name: name.into(),
            location,
            schema,
        }
    }
}

/// A response of an operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// Schema of the response body, if any.
    pub schema: Option<SchemaId>,
}

/// A single HTTP operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operation {
    /// `operationId`, if the document declares one.
    pub operation_id: Option<String>,
    /// Parameters, request body included.
    pub parameters: Vec<Parameter>,
    /// Responses keyed by status code (or `default`).
    pub responses: IndexMap<String, Response>,
}

impl Operation {
    /// Every schema root of the operation: parameters first, then responses.
    pub fn schema_roots(&self) -> impl Iterator<Item = Option<SchemaId>> + '_ {
        self.parameters
            .iter()
            .map(|p| p.schema)
            .chain(self.responses.values().map(|r| r.schema))
    }
}

/// All operations under one path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathItem {
    /// Operations keyed by HTTP method.
    pub operations: IndexMap<HttpMethod, Operation>,
}

/// The API description being pruned.
///
/// Owns the schema arena, the paths table and the definitions table.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub(crate) schemas: Vec<Schema>,
    /// Operations keyed by path template.
    pub paths: IndexMap<String, PathItem>,
    /// Named definitions (`components/schemas` or `definitions`).
    pub definitions: IndexMap<String, SchemaId>,
}

impl Document {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move a schema into the arena and return its handle.
    pub fn add_schema(&mut self, schema: Schema) -> SchemaId {
        let id = SchemaId(self.schemas.len());
        self.schemas.push(schema);
        id
    }

    /// Add a schema and register it as the named definition `name`.
    ///
    /// Replaces any previous definition of the same name.
    pub fn define(&mut self, name: impl Into<String>, schema: Schema) -> SchemaId {
        let id = self.add_schema(schema);
        self.definitions.insert(name.into(), id);
        id
    }

    /// Look up a schema node.
    #[must_use]
    pub fn schema(&self, id: SchemaId) -> Option<&Schema> {
        self.schemas.get(id.0)
    }

    /// Handle of the named definition.
    #[must_use]
    pub fn definition(&self, name: &str) -> Option<SchemaId> {
        self.definitions.get(name).copied()
    }

    /// Insert an operation, creating the path item if needed.
    pub fn add_operation(&mut self, path: impl Into<String>, method: HttpMethod, operation: Operation) {
        self.paths
            .entry(path.into())
            .or_default()
            .operations
            .insert(method, operation);
    }

    /// Look up an operation.
    #[must_use]
    pub fn operation(&self, path: &str, method: HttpMethod) -> Option<&Operation> {
        self.paths.get(path)?.operations.get(&method)
    }

    /// Iterate over `(path, method, operation)` in document order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, HttpMethod, &Operation)> {
        self.paths.iter().flat_map(|(path, item)| {
            item.operations
                .iter()
                .map(move |(method, op)| (path.as_str(), *method, op))
        })
    }

    /// Read-only view of the schema graph used by the walker.
    #[must_use]
    pub fn graph(&self) -> crate::prune::Graph<'_> {
        crate::prune::Graph::new(&self.schemas, &self.definitions)
    }

    /// Count of every named definition, in definitions order.
    pub fn definition_counts<'a>(
        &'a self,
        counts: &'a crate::prune::RefCounts,
    ) -> impl Iterator<Item = (&'a str, i64)> + 'a {
        self.definitions
            .iter()
            .map(|(name, id)| (name.as_str(), counts.get(*id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_method_round_trips_through_key() {
        for method in HttpMethod::ALL {
            assert_eq!(HttpMethod::from_key(method.as_str()), Some(method));
        }
        assert_eq!(HttpMethod::from_key("parameters"), None);
        assert_eq!(HttpMethod::from_key("GET"), None);
    }

    #[test]
    fn children_follow_traversal_order() {
        let mut doc = Document::new();
        let item = doc.add_schema(Schema::leaf());
        let branch = doc.add_schema(Schema::leaf());
        let prop = doc.add_schema(Schema::leaf());
        let extra = doc.add_schema(Schema::leaf());

        let node = Schema {
            item: Some(item),
            one_of: vec![branch],
            properties: [("name".to_string(), prop)].into_iter().collect(),
            additional_properties: Some(extra),
            ..Schema::default()
        };

        let children: Vec<_> = node.children().collect();
        assert_eq!(children, vec![item, branch, prop, extra]);
        assert!(!node.is_leaf());
        assert!(Schema::leaf().is_leaf());
        assert!(!Schema::reference("User").is_leaf());
    }

    #[test]
    fn structurally_equal_schemas_get_distinct_handles() {
        let mut doc = Document::new();
        let a = doc.add_schema(Schema::leaf());
        let b = doc.add_schema(Schema::leaf());
        assert_ne!(a, b);
        assert_eq!(doc.schema(a), doc.schema(b));
    }

    #[test]
    fn operations_iterate_in_document_order() {
        let mut doc = Document::new();
        doc.add_operation("/users", HttpMethod::Get, Operation::default());
        doc.add_operation("/users", HttpMethod::Post, Operation::default());
        doc.add_operation("/profile", HttpMethod::Get, Operation::default());

        let seen: Vec<_> = doc.operations().map(|(p, m, _)| (p, m)).collect();
        assert_eq!(
            seen,
            vec![
                ("/users", HttpMethod::Get),
                ("/users", HttpMethod::Post),
                ("/profile", HttpMethod::Get),
            ]
        );
    }

    #[test]
    fn definition_counts_follow_definitions_order() {
        let mut doc = Document::new();
        let zebra = doc.define("Zebra", Schema::leaf());
        doc.define("Ant", Schema::leaf());

        let mut counts = crate::prune::RefCounts::new();
        counts.increment(zebra);
        counts.increment(zebra);

        let seen: Vec<_> = doc.definition_counts(&counts).collect();
        assert_eq!(seen, vec![("Zebra", 2), ("Ant", 0)]);
    }

    #[test]
    fn schema_roots_list_parameters_before_responses() {
        let mut doc = Document::new();
        let param = doc.add_schema(Schema::leaf());
        let body = doc.add_schema(Schema::leaf());

        let mut op = Operation::default();
        op.parameters
            .push(Parameter::new("id", ParameterLocation::Path, Some(param)));
        op.parameters
            .push(Parameter::new("flag", ParameterLocation::Query, None));
        op.responses.insert(
            "200".to_string(),
            Response { schema: Some(body) },
        );

        let roots: Vec<_> = op.schema_roots().collect();
        assert_eq!(roots, vec![Some(param), None, Some(body)]);
    }
}
