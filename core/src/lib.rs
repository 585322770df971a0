#![deny(missing_docs)]

//! # Schema Client Core
//!
//! Turns a Swagger/OpenAPI document into a callable client: the document is
//! resolved into a definition graph, Record Types are generated for named
//! models, and every operation can be called with dynamically typed
//! arguments that are validated, encoded, dispatched and decoded against the
//! same schema.

/// Shared error types.
pub mod error;

/// Native value model.
pub mod value;

/// Definition graph, `$ref` handling and Record Types.
pub mod schema;

/// Recursive encode/decode.
pub mod marshal;

/// Operations, parameters and requests.
pub mod operation;

/// The resolved document root.
pub mod spec;

/// Transport seam and two-phase invocation.
pub mod invoke;

/// Client facade.
pub mod client;

/// TTL cache with an injectable clock.
pub mod cache;

/// Document loading.
pub mod loader;

/// HTTP transport.
#[cfg(feature = "http")]
pub mod http;

pub use cache::{ClientCache, Clock, ManualClock, SystemClock};
pub use client::Client;
pub use error::{ClientError, ClientResult};
pub use invoke::{handle_response, PendingCall, RawResponse, Transport};
pub use loader::{load_path, parse_document, LoadedDocument};
pub use marshal::Marshaller;
pub use operation::{
    CollectionFormat, FormField, HttpMethod, Operation, Param, ParamLocation, Request,
    RequestBody, RequestOptions, ResponseMatch, ResponseSpec,
};
pub use schema::{
    DefId, Definition, DefinitionGraph, DefinitionKind, FieldSpec, ModelRegistry, Primitive,
    RecordType, WireType,
};
pub use spec::{Spec, SpecOptions};
pub use value::{Model, Value};

#[cfg(feature = "http")]
pub use http::{HttpTransport, HttpTransportBuilder};
#[cfg(feature = "http")]
pub use loader::load_url;
