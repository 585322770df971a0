#![deny(missing_docs)]

//! # Parameter Binding
//!
//! Declared inputs of an operation and the logic that validates call
//! arguments and places their encoded form into a [`Request`].
//!
//! Handles Swagger 2.0 `collectionFormat`, the legacy `paramType` /
//! `allowMultiple` spellings and OpenAPI 3 `style`/`explode`.

use crate::error::{ClientError, ClientResult};
use crate::marshal::Marshaller;
use crate::operation::request::{FormField, Request, RequestBody};
use crate::schema::document::{ShimParameter, ShimSchema};
use crate::schema::graph::{DefId, GraphBuilder, Primitive};
use crate::value::Value;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value as JsonValue;
use std::fmt;

/// Characters escaped in a path segment: everything but unreserved ones.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Where a parameter is placed in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    /// Substituted into the path template.
    Path,
    /// Query string entry.
    Query,
    /// Request header.
    Header,
    /// Form field (urlencoded or multipart).
    FormData,
    /// The JSON payload.
    Body,
}

impl ParamLocation {
    /// Parses a location, accepting the legacy `form` spelling.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "path" => Some(ParamLocation::Path),
            "query" => Some(ParamLocation::Query),
            "header" => Some(ParamLocation::Header),
            "formData" | "form" => Some(ParamLocation::FormData),
            "body" => Some(ParamLocation::Body),
            _ => None,
        }
    }
}

impl fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::FormData => "formData",
            ParamLocation::Body => "body",
        };
        f.write_str(s)
    }
}

/// How array values are serialized outside a JSON body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollectionFormat {
    /// Comma separated (`a,b`).
    #[default]
    Csv,
    /// Space separated (`a b`).
    Ssv,
    /// Tab separated.
    Tsv,
    /// Pipe separated (`a|b`).
    Pipes,
    /// One entry per value (`k=a&k=b`). Only valid in query and form data.
    Multi,
}

impl CollectionFormat {
    /// Parses a Swagger 2.0 `collectionFormat` value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "csv" => Some(CollectionFormat::Csv),
            "ssv" => Some(CollectionFormat::Ssv),
            "tsv" => Some(CollectionFormat::Tsv),
            "pipes" => Some(CollectionFormat::Pipes),
            "multi" => Some(CollectionFormat::Multi),
            _ => None,
        }
    }

    fn separator(self) -> &'static str {
        match self {
            CollectionFormat::Csv | CollectionFormat::Multi => ",",
            CollectionFormat::Ssv => " ",
            CollectionFormat::Tsv => "\t",
            CollectionFormat::Pipes => "|",
        }
    }
}

impl fmt::Display for CollectionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CollectionFormat::Csv => "csv",
            CollectionFormat::Ssv => "ssv",
            CollectionFormat::Tsv => "tsv",
            CollectionFormat::Pipes => "pipes",
            CollectionFormat::Multi => "multi",
        };
        f.write_str(s)
    }
}

/// One declared input of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name.
    pub name: String,
    /// Wire location.
    pub location: ParamLocation,
    /// Value definition.
    pub definition: DefId,
    /// Whether the caller must supply it.
    pub required: bool,
    /// Declared default, already in wire form.
    pub default: Option<JsonValue>,
    /// Array serialization outside JSON bodies.
    pub collection_format: CollectionFormat,
}

impl Param {
    /// Lowers a parameter declaration, adding its value schema to the graph.
    ///
    /// Returns `Ok(None)` for locations this client does not bind (e.g.
    /// `cookie`).
    pub(crate) fn lower(
        shim: &ShimParameter,
        builder: &mut GraphBuilder,
        is_oas3: bool,
    ) -> ClientResult<Option<Self>> {
        let Some(raw_location) = shim.location() else {
            return Err(ClientError::schema(format!(
                "Parameter '{}' does not declare a location",
                shim.name
            )));
        };
        let Some(location) = ParamLocation::parse(raw_location) else {
            tracing::warn!(param = %shim.name, location = raw_location, "skipping parameter with unsupported location");
            return Ok(None);
        };
        if shim.name.is_empty() {
            return Err(ClientError::schema(format!(
                "A {} parameter is missing its name",
                location
            )));
        }

        // Body parameters and OpenAPI 3 carry `schema`; Swagger 2.0 scalars are inline.
        let schema: &ShimSchema = shim.schema.as_ref().unwrap_or(&shim.inline);
        let definition = builder.add_anonymous(schema)?;
        let default = shim.inline.default.clone().or_else(|| {
            shim.schema
                .as_ref()
                .and_then(|s| s.default.clone())
        });

        Ok(Some(Self {
            name: shim.name.clone(),
            location,
            definition,
            required: shim.required || location == ParamLocation::Path,
            default,
            collection_format: resolve_collection_format(shim, location, is_oas3)?,
        }))
    }
}

/// Picks the collection format.
///
/// Priority:
/// 1. Legacy `allowMultiple`.
/// 2. Swagger 2.0 `collectionFormat`.
/// 3. OpenAPI 3 `style`/`explode`.
/// 4. The location default (`multi` for OpenAPI 3 query parameters).
fn resolve_collection_format(
    shim: &ShimParameter,
    location: ParamLocation,
    is_oas3: bool,
) -> ClientResult<CollectionFormat> {
    if shim.allow_multiple {
        return Ok(CollectionFormat::Multi);
    }
    if let Some(cf) = shim.collection_format.as_deref() {
        return CollectionFormat::parse(cf).ok_or_else(|| {
            ClientError::schema(format!(
                "Parameter '{}' has unsupported collectionFormat '{}'",
                shim.name, cf
            ))
        });
    }
    let form_default = is_oas3 && matches!(location, ParamLocation::Query | ParamLocation::FormData);
    let format = match shim.style.as_deref() {
        Some("form") => {
            if shim.explode.unwrap_or(true) {
                CollectionFormat::Multi
            } else {
                CollectionFormat::Csv
            }
        }
        Some("spaceDelimited") => CollectionFormat::Ssv,
        Some("pipeDelimited") => CollectionFormat::Pipes,
        Some("simple") => CollectionFormat::Csv,
        Some(other) => {
            return Err(ClientError::schema(format!(
                "Parameter '{}' has unsupported style '{}'",
                shim.name, other
            )))
        }
        None if form_default && shim.explode.unwrap_or(true) => CollectionFormat::Multi,
        None => CollectionFormat::Csv,
    };
    Ok(format)
}

/// Validates call arguments against a parameter set and fills a request.
///
/// Supplied names are consumed first; declared parameters left over are then
/// checked for `required` and `default`.
pub(crate) struct Binder<'a> {
    operation_id: &'a str,
    marshaller: Marshaller<'a>,
    params: Vec<&'a Param>,
    path: String,
}

impl<'a> Binder<'a> {
    pub(crate) fn new(
        operation_id: &'a str,
        marshaller: Marshaller<'a>,
        params: impl Iterator<Item = &'a Param>,
        path_template: &str,
    ) -> Self {
        Self {
            operation_id,
            marshaller,
            params: params.collect(),
            path: path_template.to_string(),
        }
    }

    /// Binds one supplied argument. `null` counts as not supplied.
    pub(crate) fn supply(
        &mut self,
        request: &mut Request,
        name: &str,
        value: &Value,
    ) -> ClientResult<()> {
        let Some(index) = self.params.iter().position(|p| p.name == name) else {
            return Err(ClientError::InvalidArgument {
                operation_id: self.operation_id.to_string(),
                name: name.to_string(),
            });
        };
        if value.is_null() {
            return Ok(());
        }
        let param = self.params.remove(index);
        self.place_value(request, param, value)
            .map_err(|e| e.in_parameter(self.operation_id, &param.name))
    }

    /// Checks the parameters nobody supplied and applies their defaults.
    /// Returns the expanded path.
    pub(crate) fn finish(self, request: &mut Request) -> ClientResult<String> {
        let Binder {
            operation_id,
            params,
            mut path,
            ..
        } = self;
        for param in params {
            if param.required {
                return Err(ClientError::MissingArgument {
                    operation_id: operation_id.to_string(),
                    name: param.name.clone(),
                });
            }
            if let Some(default) = &param.default {
                place_wire(request, &mut path, param, default.clone())
                    .map_err(|e| e.in_parameter(operation_id, &param.name))?;
            }
        }
        Ok(path)
    }

    fn place_value(&mut self, request: &mut Request, param: &Param, value: &Value) -> ClientResult<()> {
        if param.location == ParamLocation::FormData && self.is_file(param) {
            let content = match value {
                Value::Bytes(bytes) => bytes.clone(),
                Value::String(text) => text.clone().into_bytes(),
                _ => return Err(ClientError::schema("file parameters take bytes or text")),
            };
            request.push_form_field(FormField::File {
                name: param.name.clone(),
                content,
            });
            return Ok(());
        }
        let wire = self.marshaller.encode(param.definition, value)?;
        place_wire(request, &mut self.path, param, wire)
    }

    fn is_file(&self, param: &Param) -> bool {
        self.marshaller
            .graph()
            .deref(param.definition)
            .map(|(_, def)| def.primitive() == Some(Primitive::File))
            .unwrap_or(false)
    }
}

/// Places an encoded value at the parameter's location.
fn place_wire(
    request: &mut Request,
    path: &mut String,
    param: &Param,
    wire: JsonValue,
) -> ClientResult<()> {
    match param.location {
        ParamLocation::Body => {
            request.body = Some(RequestBody::Json(wire));
        }
        ParamLocation::Path => {
            let rendered = join_values(&wire, param.collection_format);
            let encoded = utf8_percent_encode(&rendered, PATH_SEGMENT).to_string();
            *path = path.replace(&format!("{{{}}}", param.name), &encoded);
        }
        ParamLocation::Header => {
            request
                .headers
                .insert(param.name.clone(), join_values(&wire, param.collection_format));
        }
        ParamLocation::Query => {
            for value in split_values(&wire, param.collection_format) {
                request.query.push((param.name.clone(), value));
            }
        }
        ParamLocation::FormData => {
            for value in split_values(&wire, param.collection_format) {
                request.push_form_field(FormField::Text {
                    name: param.name.clone(),
                    value,
                });
            }
        }
    }
    Ok(())
}

/// One entry per element for `multi`, otherwise a single joined entry.
fn split_values(wire: &JsonValue, format: CollectionFormat) -> Vec<String> {
    match (wire, format) {
        (JsonValue::Array(items), CollectionFormat::Multi) => items.iter().map(render_scalar).collect(),
        _ => vec![join_values(wire, format)],
    }
}

fn join_values(wire: &JsonValue, format: CollectionFormat) -> String {
    match wire {
        JsonValue::Array(items) => items
            .iter()
            .map(render_scalar)
            .collect::<Vec<_>>()
            .join(format.separator()),
        other => render_scalar(other),
    }
}

/// Renders an encoded scalar for path, query, header and form placement.
fn render_scalar(wire: &JsonValue) -> String {
    match wire {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shim(value: JsonValue) -> ShimParameter {
        serde_json::from_value(value).unwrap()
    }

    fn lower(value: JsonValue, is_oas3: bool) -> Param {
        let mut builder = GraphBuilder::new();
        Param::lower(&shim(value), &mut builder, is_oas3)
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_swagger2_collection_formats() {
        let param = lower(
            json!({"name": "tags", "in": "query", "type": "array",
                   "items": {"type": "string"}, "collectionFormat": "pipes"}),
            false,
        );
        assert_eq!(param.collection_format, CollectionFormat::Pipes);

        let param = lower(
            json!({"name": "tags", "in": "query", "type": "array", "items": {"type": "string"}}),
            false,
        );
        assert_eq!(param.collection_format, CollectionFormat::Csv);
    }

    #[test]
    fn test_oas3_style_mapping() {
        let base = |style: &str, explode: bool| {
            lower(
                json!({"name": "ids", "in": "query", "style": style, "explode": explode,
                       "schema": {"type": "array", "items": {"type": "integer"}}}),
                true,
            )
            .collection_format
        };
        assert_eq!(base("form", true), CollectionFormat::Multi);
        assert_eq!(base("form", false), CollectionFormat::Csv);
        assert_eq!(base("spaceDelimited", false), CollectionFormat::Ssv);
        assert_eq!(base("pipeDelimited", false), CollectionFormat::Pipes);

        let implicit = lower(
            json!({"name": "ids", "in": "query",
                   "schema": {"type": "array", "items": {"type": "integer"}}}),
            true,
        );
        assert_eq!(implicit.collection_format, CollectionFormat::Multi);
    }

    #[test]
    fn test_legacy_spellings() {
        let param = lower(
            json!({"name": "status", "paramType": "query", "type": "string",
                   "allowMultiple": true, "required": "false"}),
            false,
        );
        assert_eq!(param.location, ParamLocation::Query);
        assert_eq!(param.collection_format, CollectionFormat::Multi);
        assert!(!param.required);

        let param = lower(json!({"name": "file", "paramType": "form", "type": "File"}), false);
        assert_eq!(param.location, ParamLocation::FormData);
    }

    #[test]
    fn test_path_params_are_always_required() {
        let param = lower(json!({"name": "petId", "in": "path", "type": "integer"}), false);
        assert!(param.required);
    }

    #[test]
    fn test_default_is_kept_in_wire_form() {
        let param = lower(
            json!({"name": "limit", "in": "query", "type": "integer", "default": 20}),
            false,
        );
        assert_eq!(param.default, Some(json!(20)));
        let param = lower(
            json!({"name": "limit", "in": "query", "schema": {"type": "integer", "default": 50}}),
            true,
        );
        assert_eq!(param.default, Some(json!(50)));
    }

    #[test]
    fn test_cookie_params_are_skipped() {
        let mut builder = GraphBuilder::new();
        let lowered = Param::lower(
            &shim(json!({"name": "session", "in": "cookie", "schema": {"type": "string"}})),
            &mut builder,
            true,
        )
        .unwrap();
        assert!(lowered.is_none());
    }

    #[test]
    fn test_unknown_collection_format_rejected() {
        let mut builder = GraphBuilder::new();
        let err = Param::lower(
            &shim(json!({"name": "x", "in": "query", "type": "array",
                         "items": {"type": "string"}, "collectionFormat": "json"})),
            &mut builder,
            false,
        );
        assert!(matches!(err, Err(ClientError::Schema(_))));
    }

    #[test]
    fn test_rendering() {
        assert_eq!(join_values(&json!(["a", "b"]), CollectionFormat::Csv), "a,b");
        assert_eq!(join_values(&json!([1, 2]), CollectionFormat::Ssv), "1 2");
        assert_eq!(join_values(&json!(["a", "b"]), CollectionFormat::Tsv), "a\tb");
        assert_eq!(join_values(&json!(true), CollectionFormat::Csv), "true");
        assert_eq!(join_values(&json!(2.5), CollectionFormat::Csv), "2.5");
        assert_eq!(
            split_values(&json!(["available", "sold"]), CollectionFormat::Multi),
            vec!["available", "sold"]
        );
    }

    #[test]
    fn test_path_segment_encoding() {
        let encoded = utf8_percent_encode("${n} review", PATH_SEGMENT).to_string();
        assert_eq!(encoded, "%24%7Bn%7D%20review");
        let encoded = utf8_percent_encode("a-b.c_d~e/f", PATH_SEGMENT).to_string();
        assert_eq!(encoded, "a-b.c_d~e%2Ff");
    }
}
