#![deny(missing_docs)]

//! # Document Shims
//!
//! Structures acting as an Intermediate Deserialization Layer.
//! These structs map directly to Swagger 2.0 / OpenAPI 3 JSON objects and are
//! only used while a `Spec` is being built.

use indexmap::IndexMap;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JsonValue;

/// Root document. Both Swagger 2.0 and OpenAPI 3 spellings are read.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimDocument {
    /// Swagger version (e.g. "2.0").
    pub swagger: Option<String>,
    /// OpenAPI version (e.g. "3.0.3").
    pub openapi: Option<String>,
    /// Swagger 2.0 host (e.g. "petstore.swagger.io").
    pub host: Option<String>,
    /// Swagger 2.0 base path, or an absolute URL in legacy documents.
    #[serde(rename = "basePath")]
    pub base_path: Option<String>,
    /// Swagger 2.0 transfer schemes.
    #[serde(default)]
    pub schemes: Vec<String>,
    /// OpenAPI 3 servers.
    #[serde(default)]
    pub servers: Vec<ShimServer>,
    /// Swagger 2.0 model table.
    #[serde(default)]
    pub definitions: IndexMap<String, ShimSchema>,
    /// Swagger 2.0 shared parameters.
    #[serde(default)]
    pub parameters: IndexMap<String, ShimParameter>,
    /// Swagger 2.0 shared responses.
    #[serde(default)]
    pub responses: IndexMap<String, ShimResponse>,
    /// OpenAPI 3 components.
    pub components: Option<ShimComponents>,
    /// Path table.
    #[serde(default, deserialize_with = "deserialize_paths")]
    pub paths: IndexMap<String, ShimPathItem>,
}

/// OpenAPI 3 server entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ShimServer {
    /// Server URL.
    pub url: String,
}

/// OpenAPI 3 components (the subset needed for marshalling).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimComponents {
    /// Model table.
    #[serde(default)]
    pub schemas: IndexMap<String, ShimSchema>,
    /// Shared parameters.
    #[serde(default)]
    pub parameters: IndexMap<String, ShimParameter>,
    /// Shared responses.
    #[serde(default)]
    pub responses: IndexMap<String, ShimResponse>,
    /// Shared request bodies.
    #[serde(rename = "requestBodies", default)]
    pub request_bodies: IndexMap<String, ShimRequestBody>,
}

/// A path item containing operations for different HTTP methods.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimPathItem {
    /// Path-level parameters shared by all operations.
    #[serde(default)]
    pub parameters: Vec<ShimParameter>,
    /// GET
    pub get: Option<ShimOperation>,
    /// PUT
    pub put: Option<ShimOperation>,
    /// POST
    pub post: Option<ShimOperation>,
    /// DELETE
    pub delete: Option<ShimOperation>,
    /// OPTIONS
    pub options: Option<ShimOperation>,
    /// HEAD
    pub head: Option<ShimOperation>,
    /// PATCH
    pub patch: Option<ShimOperation>,
}

/// An API operation (endpoint).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimOperation {
    /// Explicit operation identifier.
    #[serde(rename = "operationId")]
    pub operation_id: Option<String>,
    /// Grouping tags.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Declared parameters.
    #[serde(default)]
    pub parameters: Vec<ShimParameter>,
    /// OpenAPI 3 request body.
    #[serde(rename = "requestBody")]
    pub request_body: Option<ShimRequestBody>,
    /// Parameter name used for an OpenAPI 3 request body.
    #[serde(rename = "x-codegen-request-body-name")]
    pub request_body_name: Option<String>,
    /// Response table keyed by status code string or `default`.
    #[serde(default)]
    pub responses: IndexMap<String, ShimResponse>,
}

/// A parameter declaration, or a `$ref` to one.
///
/// Reads Swagger 2.0 (`in`, `type`, `collectionFormat`), legacy Swagger 1.2
/// (`paramType`, `allowMultiple`) and OpenAPI 3 (`schema`, `style`, `explode`)
/// spellings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimParameter {
    /// Reference to a shared parameter.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,
    /// Name of the parameter.
    #[serde(default)]
    pub name: String,
    /// Location of the parameter (path, query, header, formData, body).
    #[serde(rename = "in")]
    pub parameter_in: Option<String>,
    /// Legacy location spelling.
    #[serde(rename = "paramType")]
    pub param_type: Option<String>,
    /// Whether the parameter is required.
    #[serde(default, deserialize_with = "deserialize_loose_bool")]
    pub required: bool,
    /// Body schema (Swagger 2.0) or value schema (OpenAPI 3).
    pub schema: Option<ShimSchema>,
    /// Collection format (Swagger 2.0).
    #[serde(rename = "collectionFormat")]
    pub collection_format: Option<String>,
    /// Legacy multi-value flag.
    #[serde(rename = "allowMultiple", default, deserialize_with = "deserialize_loose_bool")]
    pub allow_multiple: bool,
    /// Serialization style (OpenAPI 3).
    pub style: Option<String>,
    /// Explode modifier (OpenAPI 3).
    pub explode: Option<bool>,
    /// Inline value schema (Swagger 2.0 non-body parameters).
    #[serde(flatten)]
    pub inline: ShimSchema,
}

impl ShimParameter {
    /// The declared location, preferring `in` over the legacy `paramType`.
    pub fn location(&self) -> Option<&str> {
        self.parameter_in.as_deref().or(self.param_type.as_deref())
    }
}

/// OpenAPI 3 request body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimRequestBody {
    /// Reference to a shared request body.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,
    /// Whether the body is required.
    #[serde(default)]
    pub required: bool,
    /// Media type table.
    #[serde(default)]
    pub content: IndexMap<String, ShimMediaType>,
}

/// A response definition, or a `$ref` to one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimResponse {
    /// Reference to a shared response.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,
    /// Swagger 2.0 result schema.
    pub schema: Option<ShimSchema>,
    /// OpenAPI 3 media type table.
    #[serde(default)]
    pub content: IndexMap<String, ShimMediaType>,
}

/// Media type content (e.g., application/json).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimMediaType {
    /// Schema of the payload.
    pub schema: Option<ShimSchema>,
}

/// A JSON Schema node as written in the document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShimSchema {
    /// Reference to a named definition.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,
    /// The declared type; may be a list in OpenAPI 3.1.
    #[serde(rename = "type")]
    pub schema_type: Option<ShimType>,
    /// Format modifier (int64, date, date-time, ...).
    pub format: Option<String>,
    /// Item schema for arrays.
    pub items: Option<Box<ShimSchema>>,
    /// Properties for objects, in declaration order.
    #[serde(default)]
    pub properties: IndexMap<String, ShimSchema>,
    /// Required property names.
    #[serde(default)]
    pub required: ShimRequired,
    /// Allowed values.
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<JsonValue>,
    /// Default value.
    pub default: Option<JsonValue>,
    /// Explicit model name for an inline object.
    #[serde(rename = "x-model")]
    pub x_model: Option<String>,
}

/// Schema type can be a single type or an array of types (for nullable).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ShimType {
    /// `"type": "string"`
    Single(String),
    /// `"type": ["string", "null"]`
    Multiple(Vec<String>),
}

impl ShimType {
    /// The first non-null type name, lowercased.
    pub fn primary(&self) -> Option<String> {
        match self {
            ShimType::Single(t) => Some(t.to_ascii_lowercase()),
            ShimType::Multiple(types) => types
                .iter()
                .find(|t| t.as_str() != "null")
                .map(|t| t.to_ascii_lowercase()),
        }
    }
}

/// `required` is a list of property names on schemas, but a boolean on
/// parameter declarations that get flattened into the inline schema.
#[derive(Debug, Clone, Default)]
pub struct ShimRequired(pub Vec<String>);

impl<'de> Deserialize<'de> for ShimRequired {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match JsonValue::deserialize(deserializer)? {
            JsonValue::Array(items) => Ok(Self(
                items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            )),
            _ => Ok(Self::default()),
        }
    }
}

/// Legacy documents write booleans as strings (`"required": "true"`).
fn deserialize_loose_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Bool(b) => Ok(b),
        JsonValue::String(s) => Ok(s.eq_ignore_ascii_case("true")),
        JsonValue::Null => Ok(false),
        other => Err(DeError::custom(format!("expected boolean, found {}", other))),
    }
}

/// Skips `x-` extensions in the path table.
fn deserialize_paths<'de, D>(deserializer: D) -> Result<IndexMap<String, ShimPathItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, JsonValue>::deserialize(deserializer)?;
    let mut items = IndexMap::new();
    for (key, value) in raw {
        if key.starts_with("x-") {
            continue;
        }
        let path_item = serde_json::from_value::<ShimPathItem>(value)
            .map_err(|e| DeError::custom(format!("Failed to parse path item '{}': {}", key, e)))?;
        items.insert(key, path_item);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parameter_reads_inline_schema_and_flags() {
        let param: ShimParameter = serde_json::from_value(json!({
            "name": "status",
            "in": "query",
            "type": "array",
            "items": {"type": "string"},
            "collectionFormat": "multi",
            "required": "true",
            "default": "available"
        }))
        .unwrap();

        assert_eq!(param.location(), Some("query"));
        assert!(param.required);
        assert_eq!(param.collection_format.as_deref(), Some("multi"));
        assert_eq!(
            param.inline.schema_type.and_then(|t| t.primary()).as_deref(),
            Some("array")
        );
        assert!(param.inline.items.is_some());
        assert_eq!(param.inline.default, Some(json!("available")));
    }

    #[test]
    fn test_legacy_param_type() {
        let param: ShimParameter = serde_json::from_value(json!({
            "name": "vaccineFile",
            "paramType": "form",
            "type": "File",
            "allowMultiple": "false"
        }))
        .unwrap();
        assert_eq!(param.location(), Some("form"));
        assert!(!param.allow_multiple);
    }

    #[test]
    fn test_nullable_type_list() {
        let schema: ShimSchema =
            serde_json::from_value(json!({"type": ["null", "integer"]})).unwrap();
        assert_eq!(
            schema.schema_type.and_then(|t| t.primary()).as_deref(),
            Some("integer")
        );
    }

    #[test]
    fn test_paths_skip_extensions() {
        let doc: ShimDocument = serde_json::from_value(json!({
            "swagger": "2.0",
            "paths": {
                "x-internal": {"anything": true},
                "/pet": {"get": {"responses": {}}}
            }
        }))
        .unwrap();
        assert_eq!(doc.paths.len(), 1);
        assert!(doc.paths["/pet"].get.is_some());
    }
}
