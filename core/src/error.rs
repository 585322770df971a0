//! # Error Handling
//!
//! Provides the unified `ClientError` enum used across the workspace.
//!
//! Schema and argument errors are raised while a request is being built, so a
//! failed call never reaches the transport. Response errors surface only when
//! a pending call is resolved.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: only the wrapper variants take part in `From` conversions.
#[derive(Debug, Display, From)]
pub enum ClientError {
    /// Unresolved reference, malformed definition, or a required property
    /// missing while encoding.
    #[from(ignore)]
    #[display("Schema Error: {_0}")]
    Schema(String),

    /// The caller supplied a parameter the operation does not declare.
    #[from(ignore)]
    #[display("Invalid Argument: {operation_id} does not have parameter '{name}'")]
    InvalidArgument {
        /// Operation being invoked.
        operation_id: String,
        /// The unrecognized parameter name.
        name: String,
    },

    /// A required parameter was not supplied.
    #[from(ignore)]
    #[display("Missing Argument: '{name}' is a required parameter of {operation_id}")]
    MissingArgument {
        /// Operation being invoked.
        operation_id: String,
        /// The omitted parameter name.
        name: String,
    },

    /// The response status matched neither an explicit response, `default`,
    /// nor the implicit 200 fallback.
    #[from(ignore)]
    #[display("Unexpected Response: {operation_id} returned status {status}: {body}")]
    UnexpectedResponse {
        /// Operation being invoked.
        operation_id: String,
        /// HTTP status code returned by the server.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// No operation with the given identifier exists in the document.
    #[from(ignore)]
    #[display("Unknown Operation: '{_0}'")]
    UnknownOperation(String),

    /// The transport failed to deliver the request or read the response.
    #[from(ignore)]
    #[display("Transport Error: {_0}")]
    Transport(String),

    /// Wrapper for JSON errors.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// Wrapper for YAML errors.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for ClientError {}

impl ClientError {
    /// Shorthand for a [`ClientError::Schema`] error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Attaches the operation and parameter to a schema error raised while
    /// binding a call. Other variants are returned unchanged.
    pub fn in_parameter(self, operation_id: &str, param: &str) -> Self {
        match self {
            Self::Schema(msg) => {
                Self::Schema(format!("{}: parameter '{}': {}", operation_id, param, msg))
            }
            other => other,
        }
    }
}

/// Helper type alias for Result using ClientError.
pub type ClientResult<T> = Result<T, ClientError>;
