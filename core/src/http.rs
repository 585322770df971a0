#![deny(missing_docs)]

//! # HTTP Transport
//!
//! A [`Transport`] backed by `reqwest`.
//!
//! JSON bodies are sent as `application/json`, form bodies as
//! `application/x-www-form-urlencoded`, or `multipart/form-data` when a file
//! part is present. Non-2xx statuses are returned, not rejected.

use crate::error::{ClientError, ClientResult};
use crate::invoke::{RawResponse, Transport};
use crate::operation::{FormField, HttpMethod, Request, RequestBody};
use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart;
use std::time::Duration;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Builder for configuring an [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    timeout: Duration,
    default_headers: HeaderMap,
}

impl HttpTransportBuilder {
    fn new() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: HeaderMap::new(),
        }
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adds a header sent with every request.
    ///
    /// ## Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> ClientResult<Self> {
        let (name, value) = header_pair(name.as_ref(), value.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Builds the [`HttpTransport`].
    pub fn build(self) -> ClientResult<HttpTransport> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(self.default_headers)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(HttpTransport { client })
    }
}

/// Sends requests over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a builder with a 30 second timeout and no default headers.
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    /// Creates a transport with default settings.
    pub fn new() -> ClientResult<Self> {
        Self::builder().build()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &Request) -> ClientResult<RawResponse> {
        let url = request.full_url()?;
        let mut builder = self.client.request(method(request.method), url);
        for (name, value) in &request.headers {
            let (name, value) = header_pair(name, value)?;
            builder = builder.header(name, value);
        }
        builder = match &request.body {
            None => builder,
            Some(RequestBody::Json(json)) => builder.json(json),
            Some(body @ RequestBody::Form(fields)) if body.is_multipart() => {
                builder.multipart(multipart_form(fields))
            }
            Some(RequestBody::Form(fields)) => {
                let pairs: Vec<(&str, &str)> = fields
                    .iter()
                    .filter_map(|f| match f {
                        FormField::Text { name, value } => Some((name.as_str(), value.as_str())),
                        FormField::File { .. } => None,
                    })
                    .collect();
                builder.form(&pairs)
            }
        };

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let mut headers = IndexMap::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str().to_string(), value.to_string());
            }
        }
        let body = response.bytes().await.map_err(transport_error)?.to_vec();
        tracing::debug!(status, bytes = body.len(), "received response");
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Delete => reqwest::Method::DELETE,
        HttpMethod::Options => reqwest::Method::OPTIONS,
        HttpMethod::Head => reqwest::Method::HEAD,
        HttpMethod::Patch => reqwest::Method::PATCH,
    }
}

fn multipart_form(fields: &[FormField]) -> multipart::Form {
    fields.iter().fold(multipart::Form::new(), |form, field| match field {
        FormField::Text { name, value } => form.text(name.clone(), value.clone()),
        FormField::File { name, content } => form.part(
            name.clone(),
            multipart::Part::bytes(content.clone()).file_name(name.clone()),
        ),
    })
}

fn header_pair(name: &str, value: &str) -> ClientResult<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::try_from(name)
        .map_err(|e| ClientError::Transport(format!("invalid header name '{}': {}", name, e)))?;
    let header_value = HeaderValue::try_from(value)
        .map_err(|e| ClientError::Transport(format!("invalid value for header '{}': {}", name, e)))?;
    Ok((header_name, header_value))
}

fn transport_error(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}
