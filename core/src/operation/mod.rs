#![deny(missing_docs)]

//! # Operations
//!
//! One callable endpoint (method + path) with its parameter set and response
//! table. Param sets are computed once when the document is resolved; a [`Request`]
//! is built fresh for every call.

pub mod naming;
pub mod params;
pub mod request;

pub use params::{CollectionFormat, Param, ParamLocation};
pub use request::{FormField, HttpMethod, Request, RequestBody, RequestOptions};

use crate::error::ClientResult;
use crate::marshal::Marshaller;
use crate::schema::graph::DefId;
use crate::value::Value;
use indexmap::IndexMap;
use params::Binder;

/// One entry of an operation's response table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    /// Status code string, or `default`.
    pub status: String,
    /// Result definition; `None` when the response declares no schema.
    pub schema: Option<DefId>,
}

/// Outcome of looking up a status code in the response table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResponseMatch<'a> {
    /// An exact status entry, or the `default` entry.
    Declared(&'a ResponseSpec),
    /// No entry matched and the status is 200.
    ImplicitSuccess,
    /// No entry matched.
    Unexpected,
}

/// A callable endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub(crate) id: String,
    pub(crate) method: HttpMethod,
    pub(crate) path_name: String,
    pub(crate) tags: Vec<String>,
    pub(crate) params: IndexMap<String, Param>,
    pub(crate) responses: IndexMap<String, ResponseSpec>,
}

impl Operation {
    /// Operation identifier (explicit `operationId` or derived).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// HTTP method.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Path template, e.g. `/pet/{petId}`.
    pub fn path_name(&self) -> &str {
        &self.path_name
    }

    /// Declared tags.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Parameters in binding order.
    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.params.values()
    }

    /// Looks up a parameter by name.
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.get(name)
    }

    /// Response table, keyed by status code string or `default`.
    pub fn responses(&self) -> &IndexMap<String, ResponseSpec> {
        &self.responses
    }

    /// Selects the response entry for a status code.
    ///
    /// Precedence: exact status, then `default`, then an implicit schema-less
    /// success for 200.
    pub fn select_response(&self, status: u16) -> ResponseMatch<'_> {
        if let Some(spec) = self.responses.get(&status.to_string()) {
            return ResponseMatch::Declared(spec);
        }
        if let Some(spec) = self.responses.get("default") {
            return ResponseMatch::Declared(spec);
        }
        if status == 200 {
            return ResponseMatch::ImplicitSuccess;
        }
        ResponseMatch::Unexpected
    }

    /// Builds and validates the request for one call.
    ///
    /// Nothing is sent; every schema and argument error surfaces here.
    pub fn build_request(
        &self,
        marshaller: Marshaller<'_>,
        base_url: &str,
        args: &IndexMap<String, Value>,
        options: &RequestOptions,
    ) -> ClientResult<Request> {
        let mut request = Request::new(self.method, String::new());
        for (name, value) in &options.headers {
            request.headers.insert(name.clone(), value.clone());
        }

        let mut binder = Binder::new(&self.id, marshaller, self.params.values(), &self.path_name);
        for (name, value) in args {
            binder.supply(&mut request, name, value)?;
        }
        let path = binder.finish(&mut request)?;

        request.url = format!("{}{}", base_url.trim_end_matches('/'), path);
        tracing::debug!(
            operation = %self.id,
            method = %self.method,
            url = %request.url,
            query = request.query.len(),
            "built request"
        );
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn operation(responses: &[(&str, Option<DefId>)]) -> Operation {
        Operation {
            id: "getPetById".into(),
            method: HttpMethod::Get,
            path_name: "/pet/{petId}".into(),
            tags: vec!["pet".into()],
            params: IndexMap::new(),
            responses: responses
                .iter()
                .map(|(status, schema)| {
                    (
                        status.to_string(),
                        ResponseSpec {
                            status: status.to_string(),
                            schema: *schema,
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_exact_status_wins_over_default() {
        let op = operation(&[("404", None), ("default", None)]);
        let ResponseMatch::Declared(spec) = op.select_response(404) else {
            panic!("expected declared response");
        };
        assert_eq!(spec.status, "404");
    }

    #[test]
    fn test_default_used_when_no_exact_match() {
        let op = operation(&[("404", None), ("default", None)]);
        let ResponseMatch::Declared(spec) = op.select_response(200) else {
            panic!("expected declared response");
        };
        assert_eq!(spec.status, "default");
    }

    #[test]
    fn test_implicit_success_only_for_200() {
        let op = operation(&[("404", None)]);
        assert_eq!(op.select_response(200), ResponseMatch::ImplicitSuccess);
        assert_eq!(op.select_response(201), ResponseMatch::Unexpected);
        assert_eq!(op.select_response(500), ResponseMatch::Unexpected);
    }
}
