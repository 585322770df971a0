#![deny(missing_docs)]

//! # Request Shape
//!
//! The request produced by parameter binding and consumed by a transport.
//! Built fresh for every call and owned by it.

use crate::error::{ClientError, ClientResult};
use indexmap::IndexMap;
use std::fmt;
use url::Url;

/// HTTP methods an operation can be declared under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// PUT
    Put,
    /// POST
    Post,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
    /// PATCH
    Patch,
}

impl HttpMethod {
    /// Upper-case method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Put => "PUT",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One field of a form body.
#[derive(Debug, Clone, PartialEq)]
pub enum FormField {
    /// A plain text field.
    Text {
        /// Field name.
        name: String,
        /// Rendered value.
        value: String,
    },
    /// A file upload part.
    File {
        /// Field name.
        name: String,
        /// Raw file contents.
        content: Vec<u8>,
    },
}

impl FormField {
    /// Field name.
    pub fn name(&self) -> &str {
        match self {
            FormField::Text { name, .. } | FormField::File { name, .. } => name,
        }
    }
}

/// The request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// A JSON document from a `body` parameter.
    Json(serde_json::Value),
    /// Fields from `formData` parameters, in binding order.
    Form(Vec<FormField>),
}

impl RequestBody {
    /// Returns true when the body carries at least one file part.
    pub fn is_multipart(&self) -> bool {
        match self {
            RequestBody::Json(_) => false,
            RequestBody::Form(fields) => fields
                .iter()
                .any(|f| matches!(f, FormField::File { .. })),
        }
    }
}

/// A fully bound request: `{ method, url, query, headers, body }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP method.
    pub method: HttpMethod,
    /// Base URL joined with the expanded path template, without the query.
    pub url: String,
    /// Query pairs in binding order. `multi` parameters repeat their key.
    pub query: Vec<(String, String)>,
    /// Header table.
    pub headers: IndexMap<String, String>,
    /// Optional payload.
    pub body: Option<RequestBody>,
}

impl Request {
    pub(crate) fn new(method: HttpMethod, url: String) -> Self {
        Self {
            method,
            url,
            query: Vec::new(),
            headers: IndexMap::new(),
            body: None,
        }
    }

    /// Returns every query value bound to `name`, in order.
    pub fn query_values(&self, name: &str) -> Vec<&str> {
        self.query
            .iter()
            .filter(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Parses the URL and appends the query pairs.
    pub fn full_url(&self) -> ClientResult<Url> {
        let mut url = Url::parse(&self.url).map_err(|e| {
            ClientError::Transport(format!("Invalid request URL '{}': {}", self.url, e))
        })?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }
        Ok(url)
    }

    pub(crate) fn push_form_field(&mut self, field: FormField) {
        match &mut self.body {
            Some(RequestBody::Form(fields)) => fields.push(field),
            _ => self.body = Some(RequestBody::Form(vec![field])),
        }
    }
}

/// Per-call options applied before parameters are bound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Extra headers sent with the request. Header parameters bound later
    /// replace entries with the same name.
    pub headers: IndexMap<String, String>,
}

impl RequestOptions {
    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url_appends_query_in_order() {
        let mut request = Request::new(HttpMethod::Get, "http://localhost/pet/findByStatus".into());
        request.query.push(("status".into(), "available".into()));
        request.query.push(("status".into(), "sold".into()));
        let url = request.full_url().unwrap();
        assert_eq!(url.query(), Some("status=available&status=sold"));
        assert_eq!(request.query_values("status"), vec!["available", "sold"]);
    }

    #[test]
    fn test_full_url_rejects_relative() {
        let request = Request::new(HttpMethod::Get, "/pet".into());
        assert!(matches!(request.full_url(), Err(ClientError::Transport(_))));
    }

    #[test]
    fn test_form_fields_accumulate() {
        let mut request = Request::new(HttpMethod::Post, "http://localhost/pet/1".into());
        request.push_form_field(FormField::Text {
            name: "name".into(),
            value: "Sparky".into(),
        });
        assert!(!request.body.as_ref().unwrap().is_multipart());
        request.push_form_field(FormField::File {
            name: "file".into(),
            content: b"png".to_vec(),
        });
        let Some(RequestBody::Form(fields)) = &request.body else {
            panic!("expected form body");
        };
        assert_eq!(fields.len(), 2);
        assert!(request.body.as_ref().unwrap().is_multipart());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Delete.to_string(), "DELETE");
    }
}
