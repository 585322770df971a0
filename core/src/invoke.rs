#![deny(missing_docs)]

//! # Operation Invocation
//!
//! Two-phase calls: a [`PendingCall`] is created with its request already
//! built and validated, and only [`PendingCall::result`] talks to the
//! transport and decodes the response.

use crate::error::{ClientError, ClientResult};
use crate::operation::{Operation, Request, ResponseMatch};
use crate::spec::Spec;
use crate::value::Value;
use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// A response as returned by a transport.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: IndexMap<String, String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Creates a response with a status and body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: IndexMap::new(),
            body: body.into(),
        }
    }

    /// Body as text (lossy UTF-8).
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Body parsed as JSON.
    pub fn json(&self) -> ClientResult<JsonValue> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns true when the body is empty or only whitespace.
    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

/// Sends requests. Implementations own connection handling, timeouts and
/// retries; status codes are left to the invoker.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends one request and returns the raw response.
    async fn send(&self, request: &Request) -> ClientResult<RawResponse>;
}

/// A call whose request has been built but not sent.
pub struct PendingCall {
    spec: Arc<Spec>,
    transport: Arc<dyn Transport>,
    operation_id: String,
    request: Request,
}

impl PendingCall {
    pub(crate) fn new(
        spec: Arc<Spec>,
        transport: Arc<dyn Transport>,
        operation_id: &str,
        request: Request,
    ) -> Self {
        Self {
            spec,
            transport,
            operation_id: operation_id.to_string(),
            request,
        }
    }

    /// The operation being called.
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// The request that will be sent.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Sends the request and decodes the response.
    ///
    /// Returns `Ok(None)` when the response has no body, or the body decodes
    /// to `null`.
    pub async fn result(self) -> ClientResult<Option<Value>> {
        let response = self.transport.send(&self.request).await?;
        let operation = self.spec.operation(&self.operation_id)?;
        handle_response(&self.spec, operation, &response)
    }
}

impl std::fmt::Debug for PendingCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCall")
            .field("operation_id", &self.operation_id)
            .field("request", &self.request)
            .finish()
    }
}

/// Selects the response entry for a status and decodes the body with it.
pub fn handle_response(
    spec: &Spec,
    operation: &Operation,
    response: &RawResponse,
) -> ClientResult<Option<Value>> {
    if response.is_empty() {
        tracing::debug!(operation = operation.id(), status = response.status, "empty response body");
        return Ok(None);
    }

    let value = match operation.select_response(response.status) {
        ResponseMatch::Declared(entry) => {
            tracing::debug!(
                operation = operation.id(),
                status = response.status,
                response = %entry.status,
                "decoding response"
            );
            match entry.schema {
                Some(schema) => spec.marshaller().decode(schema, &response.json()?)?,
                None => schemaless(response),
            }
        }
        ResponseMatch::ImplicitSuccess => {
            tracing::warn!(
                operation = operation.id(),
                "no response declared for status 200; returning the body undecoded"
            );
            schemaless(response)
        }
        ResponseMatch::Unexpected => {
            return Err(ClientError::UnexpectedResponse {
                operation_id: operation.id().to_string(),
                status: response.status,
                body: response.text(),
            })
        }
    };
    Ok((!value.is_null()).then_some(value))
}

/// Parsed JSON unchanged, or the text when the body is not JSON.
fn schemaless(response: &RawResponse) -> Value {
    match response.json() {
        Ok(json) => Value::from_json(&json),
        Err(_) => Value::String(response.text()),
    }
}
