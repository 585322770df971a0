#![deny(missing_docs)]

//! # Spec
//!
//! The resolved root of a schema document: the definition graph, its Record
//! Types, every operation and the base URL.
//!
//! A `Spec` is immutable once built and is shared read-only (usually behind
//! an `Arc`) by every call made through it.

use crate::error::{ClientError, ClientResult};
use crate::marshal::Marshaller;
use crate::operation::naming::{derive_operation_id, path_placeholders};
use crate::operation::{HttpMethod, Operation, Param, ParamLocation, ResponseSpec};
use crate::schema::document::{
    ShimDocument, ShimMediaType, ShimOperation, ShimParameter, ShimRequestBody, ShimResponse,
    ShimSchema,
};
use crate::schema::graph::{DefinitionGraph, GraphBuilder};
use crate::schema::refs::{extract_ref_name, RefTable};
use crate::schema::types::ModelRegistry;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use url::Url;

/// Options applied while building a [`Spec`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecOptions {
    /// Overrides the base URL derived from the document.
    pub api_url: Option<String>,
}

/// The resolved root of a schema document.
#[derive(Debug, Clone)]
pub struct Spec {
    graph: DefinitionGraph,
    models: ModelRegistry,
    operations: IndexMap<String, Operation>,
    api_url: String,
}

impl Spec {
    /// Builds a spec from a parsed JSON/YAML document.
    ///
    /// `origin` is the URL the document was fetched from, if any; it is used
    /// to derive the base URL when the document does not declare one.
    pub fn from_value(
        document: JsonValue,
        origin: Option<&str>,
        options: SpecOptions,
    ) -> ClientResult<Self> {
        let document: ShimDocument = serde_json::from_value(document)?;
        Self::from_document(&document, origin, options)
    }

    /// Builds a spec from deserialized document shims.
    pub fn from_document(
        document: &ShimDocument,
        origin: Option<&str>,
        options: SpecOptions,
    ) -> ClientResult<Self> {
        let tables = SharedTables::new(document);
        let is_oas3 = document.openapi.is_some();

        let mut builder = GraphBuilder::new();
        for (name, schema) in tables.definitions() {
            builder.add_named(name, schema)?;
        }

        let mut operations: IndexMap<String, Operation> = IndexMap::new();
        for (path_name, item) in &document.paths {
            let methods = [
                (HttpMethod::Get, &item.get),
                (HttpMethod::Put, &item.put),
                (HttpMethod::Post, &item.post),
                (HttpMethod::Delete, &item.delete),
                (HttpMethod::Options, &item.options),
                (HttpMethod::Head, &item.head),
                (HttpMethod::Patch, &item.patch),
            ];
            for (method, op) in methods {
                let Some(op) = op else { continue };
                let operation = build_operation(
                    &tables,
                    &mut builder,
                    is_oas3,
                    path_name,
                    method,
                    &item.parameters,
                    op,
                )?;
                if operations.contains_key(&operation.id) {
                    return Err(ClientError::schema(format!(
                        "Duplicate operationId '{}'",
                        operation.id
                    )));
                }
                operations.insert(operation.id.clone(), operation);
            }
        }

        let graph = builder.finish()?;
        // Alias chains that never reach a concrete node fail here, not on first use.
        for name in graph.names() {
            graph.deref(graph.resolve(name)?)?;
        }
        let models = ModelRegistry::build(&graph)?;
        let api_url = options
            .api_url
            .unwrap_or_else(|| derive_api_url(document, origin));

        tracing::debug!(
            operations = operations.len(),
            models = models.iter().count(),
            api_url = %api_url,
            "built spec"
        );
        Ok(Self {
            graph,
            models,
            operations,
            api_url,
        })
    }

    /// The definition graph.
    pub fn graph(&self) -> &DefinitionGraph {
        &self.graph
    }

    /// Record Types generated for named object definitions.
    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// A marshaller bound to this spec's definitions.
    pub fn marshaller(&self) -> Marshaller<'_> {
        Marshaller::new(&self.graph, &self.models)
    }

    /// Base URL requests are sent to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Looks up an operation by identifier.
    pub fn operation(&self, id: &str) -> ClientResult<&Operation> {
        self.operations
            .get(id)
            .ok_or_else(|| ClientError::UnknownOperation(id.to_string()))
    }

    /// All operations in document order.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> {
        self.operations.values()
    }

    /// Operations grouped by their first tag; untagged ones fall under
    /// `default`.
    pub fn resources(&self) -> IndexMap<&str, Vec<&Operation>> {
        let mut resources: IndexMap<&str, Vec<&Operation>> = IndexMap::new();
        for op in self.operations.values() {
            let tag = op.tags.first().map(String::as_str).unwrap_or("default");
            resources.entry(tag).or_default().push(op);
        }
        resources
    }
}

/// Named tables shared across operations, merged from the Swagger 2.0 and
/// OpenAPI 3 locations.
struct SharedTables<'a> {
    definitions: IndexMap<&'a str, &'a ShimSchema>,
    parameters: IndexMap<&'a str, &'a ShimParameter>,
    responses: IndexMap<&'a str, &'a ShimResponse>,
    request_bodies: IndexMap<&'a str, &'a ShimRequestBody>,
}

impl<'a> SharedTables<'a> {
    fn new(document: &'a ShimDocument) -> Self {
        let mut tables = Self {
            definitions: document
                .definitions
                .iter()
                .map(|(k, v)| (k.as_str(), v))
                .collect(),
            parameters: document
                .parameters
                .iter()
                .map(|(k, v)| (k.as_str(), v))
                .collect(),
            responses: document
                .responses
                .iter()
                .map(|(k, v)| (k.as_str(), v))
                .collect(),
            request_bodies: IndexMap::new(),
        };
        if let Some(components) = &document.components {
            tables
                .definitions
                .extend(components.schemas.iter().map(|(k, v)| (k.as_str(), v)));
            tables
                .parameters
                .extend(components.parameters.iter().map(|(k, v)| (k.as_str(), v)));
            tables
                .responses
                .extend(components.responses.iter().map(|(k, v)| (k.as_str(), v)));
            tables
                .request_bodies
                .extend(components.request_bodies.iter().map(|(k, v)| (k.as_str(), v)));
        }
        tables
    }

    fn definitions(&self) -> impl Iterator<Item = (&'a str, &'a ShimSchema)> + '_ {
        self.definitions.iter().map(|(k, v)| (*k, *v))
    }

    fn parameter(&self, shim: &'a ShimParameter) -> ClientResult<&'a ShimParameter> {
        let Some(ref_path) = &shim.ref_path else {
            return Ok(shim);
        };
        let name = extract_ref_name(ref_path, RefTable::Parameters)?;
        self.parameters
            .get(name.as_str())
            .copied()
            .ok_or_else(|| ClientError::schema(format!("Unresolved parameter reference '{}'", name)))
    }

    fn response(&self, shim: &'a ShimResponse) -> ClientResult<&'a ShimResponse> {
        let Some(ref_path) = &shim.ref_path else {
            return Ok(shim);
        };
        let name = extract_ref_name(ref_path, RefTable::Responses)?;
        self.responses
            .get(name.as_str())
            .copied()
            .ok_or_else(|| ClientError::schema(format!("Unresolved response reference '{}'", name)))
    }

    fn request_body(&self, shim: &'a ShimRequestBody) -> ClientResult<&'a ShimRequestBody> {
        let Some(ref_path) = &shim.ref_path else {
            return Ok(shim);
        };
        let name = extract_ref_name(ref_path, RefTable::RequestBodies)?;
        self.request_bodies
            .get(name.as_str())
            .copied()
            .ok_or_else(|| {
                ClientError::schema(format!("Unresolved request body reference '{}'", name))
            })
    }
}

fn build_operation<'a>(
    tables: &SharedTables<'a>,
    builder: &mut GraphBuilder,
    is_oas3: bool,
    path_name: &str,
    method: HttpMethod,
    path_params: &'a [ShimParameter],
    op: &'a ShimOperation,
) -> ClientResult<Operation> {
    let id = op
        .operation_id
        .clone()
        .unwrap_or_else(|| derive_operation_id(method.as_str(), path_name));

    // Operation-level first, then path-level: the last declaration of a name
    // is kept, so a path-level redeclaration replaces the operation's own.
    let mut params: IndexMap<String, Param> = IndexMap::new();
    for shim in op.parameters.iter().chain(path_params.iter()) {
        let shim = tables.parameter(shim)?;
        let lowered = Param::lower(shim, builder, is_oas3)
            .map_err(|e| e.in_parameter(&id, &shim.name))?;
        if let Some(param) = lowered {
            params.insert(param.name.clone(), param);
        }
    }

    if let Some(body) = &op.request_body {
        let body = tables.request_body(body)?;
        let name = op.request_body_name.clone().unwrap_or_else(|| "body".into());
        let definition = match select_media_schema(&body.content) {
            Some(schema) => builder.add_anonymous(schema)?,
            None => builder.add_anonymous(&ShimSchema::default())?,
        };
        params.insert(
            name.clone(),
            Param {
                name,
                location: ParamLocation::Body,
                definition,
                required: body.required,
                default: None,
                collection_format: Default::default(),
            },
        );
    }

    for placeholder in path_placeholders(path_name) {
        let bound = params
            .get(placeholder)
            .is_some_and(|p| p.location == ParamLocation::Path);
        if !bound {
            tracing::warn!(operation = %id, placeholder, "path placeholder has no path parameter");
        }
    }

    let mut responses = IndexMap::new();
    for (status, response) in &op.responses {
        let response = tables.response(response)?;
        let schema = response
            .schema
            .as_ref()
            .or_else(|| select_media_schema(&response.content));
        let schema = schema.map(|s| builder.add_anonymous(s)).transpose()?;
        responses.insert(
            status.clone(),
            ResponseSpec {
                status: status.clone(),
                schema,
            },
        );
    }

    Ok(Operation {
        id,
        method,
        path_name: path_name.to_string(),
        tags: op.tags.clone(),
        params,
        responses,
    })
}

/// Picks the payload schema of a media type table, preferring JSON.
fn select_media_schema(content: &IndexMap<String, ShimMediaType>) -> Option<&ShimSchema> {
    let media = content
        .get("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(k, _)| k.ends_with("+json"))
                .map(|(_, v)| v)
        })
        .or_else(|| content.get("application/*"))
        .or_else(|| content.get("*/*"))
        .or_else(|| content.values().next())?;
    media.schema.as_ref()
}

/// Derives the base URL from the document and the URL it was loaded from.
fn derive_api_url(document: &ShimDocument, origin: Option<&str>) -> String {
    let origin = origin
        .and_then(|o| Url::parse(o).ok())
        .filter(|u| matches!(u.scheme(), "http" | "https"));
    let base_path = document.base_path.as_deref().unwrap_or("");

    if let Some(server) = document.servers.first() {
        if Url::parse(&server.url).is_ok() {
            return server.url.trim_end_matches('/').to_string();
        }
        if let Some(joined) = origin.as_ref().and_then(|o| o.join(&server.url).ok()) {
            return joined.as_str().trim_end_matches('/').to_string();
        }
        return server.url.trim_end_matches('/').to_string();
    }

    if let Some(host) = &document.host {
        let scheme = document
            .schemes
            .first()
            .map(String::as_str)
            .or_else(|| origin.as_ref().map(Url::scheme))
            .unwrap_or("http");
        return format!("{}://{}{}", scheme, host, base_path.trim_end_matches('/'));
    }

    if Url::parse(base_path).is_ok() {
        return base_path.trim_end_matches('/').to_string();
    }

    let Some(origin) = origin else {
        return base_path.trim_end_matches('/').to_string();
    };
    let joined = if base_path.is_empty() {
        origin.join(".")
    } else {
        origin.join(base_path)
    };
    joined
        .map(|u| u.as_str().trim_end_matches('/').to_string())
        .unwrap_or_default()
}
