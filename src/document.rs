//! OpenAPI document model.
//!
//! These types mirror the OpenAPI 3.0 layout closely enough to be serialised directly by the
//! [`serializer`](crate::serializer) module. [`DocumentModel`] wraps one document together with the
//! bookkeeping the interpreter and the schema resolver need: the API alias, the artifact file
//! name and the set of referenced schema names.

use crate::type_extractor::TypeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// OpenAPI version written into every document
pub const OPENAPI_VERSION: &str = "3.0.0";
/// Media type used for request bodies and responses
pub const JSON_CONTENT_TYPE: &str = "application/json";

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";
const RESPONSE_REF_PREFIX: &str = "#/components/responses/";

/// Operations of one path, keyed by lower-case HTTP method
pub type PathItem = BTreeMap<String, Operation>;

/// Complete OpenAPI document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
}

/// OpenAPI Info object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: String,
}

/// OpenAPI Server object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variables: BTreeMap<String, ServerVariable>,
}

/// Substitution variable of a server URL template
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerVariable {
    pub default: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Operation object, built from one `begin` ... `end` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    #[serde(rename = "operationId", default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    /// Parameter location (path, query, header)
    #[serde(rename = "in")]
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub schema: Schema,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: Schema,
}

/// OpenAPI Response object, or a `$ref` to a shared one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub responses: BTreeMap<String, Response>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, Schema>,
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "int32", "int64", "float", "double")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
    /// Reference to a schema under `components.schemas`
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl Schema {
    pub fn of_type(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    pub fn reference_to(name: &str) -> Self {
        Self {
            reference: Some(schema_ref(name)),
            ..Self::default()
        }
    }

    pub fn array_of(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// Builds the inline schema for a type reference. Named types become `$ref`s.
    pub fn from_type_ref(type_ref: &TypeRef) -> Self {
        match type_ref {
            TypeRef::Primitive(primitive) => Self {
                schema_type: Some(primitive.schema_type().to_string()),
                format: primitive.format().map(str::to_string),
                ..Self::default()
            },
            TypeRef::Named(name) => Self::reference_to(name),
            TypeRef::List(inner) => Self::array_of(Self::from_type_ref(inner)),
            TypeRef::Object => Self::of_type("object"),
        }
    }

    /// Name of the referenced schema, if this is a reference.
    pub fn reference_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|r| r.strip_prefix(SCHEMA_REF_PREFIX))
    }

    /// Collects every schema name referenced by this schema tree, in a stable order.
    pub fn collect_references(&self, out: &mut Vec<String>) {
        if let Some(name) = self.reference_name() {
            out.push(name.to_string());
        }
        if let Some(items) = &self.items {
            items.collect_references(out);
        }
        if let Some(properties) = &self.properties {
            for schema in properties.values() {
                schema.collect_references(out);
            }
        }
    }
}

impl Response {
    pub fn described(description: String) -> Self {
        Self {
            description: Some(description),
            ..Self::default()
        }
    }

    /// A `$ref` to the shared response registered for `code`.
    pub fn shared(code: &str) -> Self {
        Self {
            reference: Some(format!("{}{}", RESPONSE_REF_PREFIX, code)),
            ..Self::default()
        }
    }

    pub fn with_json(mut self, schema: Schema) -> Self {
        self.content = Some(json_content(schema));
        self
    }

    /// A bare `response <code>` entry waiting to be linked to a shared response: no reference,
    /// no description and no inline schema.
    pub fn is_unlinked(&self) -> bool {
        self.reference.is_none()
            && self.content.is_none()
            && self.description.as_deref().unwrap_or("").is_empty()
    }

    fn collect_references(&self, out: &mut Vec<String>) {
        if let Some(content) = &self.content {
            for media in content.values() {
                media.schema.collect_references(out);
            }
        }
    }
}

/// Single `application/json` content map.
pub fn json_content(schema: Schema) -> BTreeMap<String, MediaType> {
    BTreeMap::from([(JSON_CONTENT_TYPE.to_string(), MediaType { schema })])
}

pub fn schema_ref(name: &str) -> String {
    format!("{}{}", SCHEMA_REF_PREFIX, name)
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty() && self.schemas.is_empty()
    }
}

impl Default for OpenApiDocument {
    fn default() -> Self {
        Self {
            openapi: OPENAPI_VERSION.to_string(),
            info: Info::default(),
            servers: Vec::new(),
            paths: BTreeMap::new(),
            components: Components::default(),
        }
    }
}

impl OpenApiDocument {
    /// Every schema name reachable from paths and components, first occurrence first.
    pub fn referenced_schemas(&self) -> Vec<String> {
        let mut names = Vec::new();
        for operation in self.paths.values().flat_map(|item| item.values()) {
            for parameter in &operation.parameters {
                parameter.schema.collect_references(&mut names);
            }
            if let Some(body) = &operation.request_body {
                for media in body.content.values() {
                    media.schema.collect_references(&mut names);
                }
            }
            for response in operation.responses.values() {
                response.collect_references(&mut names);
            }
        }
        for response in self.components.responses.values() {
            response.collect_references(&mut names);
        }
        for schema in self.components.schemas.values() {
            schema.collect_references(&mut names);
        }

        let mut seen = std::collections::HashSet::new();
        names.retain(|name| seen.insert(name.clone()));
        names
    }
}

/// One API under construction or ready for rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentModel {
    /// API alias; empty for the implicit single API
    pub alias: String,
    /// Artifact name set by the `filename` annotation
    pub filename: Option<String>,
    pub document: OpenApiDocument,
    /// Schema names the annotations asked for, in first-mention order
    pub referenced: Vec<String>,
}

impl DocumentModel {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            ..Self::default()
        }
    }

    /// Records a schema name that needs to be materialised. Duplicates are ignored.
    pub fn reference(&mut self, name: &str) {
        if !self.referenced.iter().any(|n| n == name) {
            self.referenced.push(name.to_string());
        }
    }

    /// File name of the rendered artifact.
    pub fn artifact_name(&self, extension: &str) -> String {
        match (&self.filename, self.alias.as_str()) {
            (Some(filename), _) => filename.clone(),
            (None, "") => format!("openapi.{}", extension),
            (None, alias) => format!("openapi.{}.{}", alias, extension),
        }
    }
}
