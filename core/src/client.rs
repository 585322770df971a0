#![deny(missing_docs)]

//! # Client
//!
//! Couples a shared [`Spec`] with a [`Transport`] and turns
//! `call(operation_id, args)` into a [`PendingCall`].

use crate::error::ClientResult;
use crate::invoke::{PendingCall, Transport};
use crate::loader::LoadedDocument;
use crate::operation::RequestOptions;
use crate::spec::{Spec, SpecOptions};
use crate::value::Value;
use indexmap::IndexMap;
use std::sync::Arc;

/// A callable client for one schema document.
#[derive(Clone)]
pub struct Client {
    spec: Arc<Spec>,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Creates a client from a built spec and a transport.
    pub fn new(spec: Arc<Spec>, transport: Arc<dyn Transport>) -> Self {
        Self { spec, transport }
    }

    /// Resolves a loaded document.
    pub fn from_document(
        loaded: LoadedDocument,
        options: SpecOptions,
        transport: Arc<dyn Transport>,
    ) -> ClientResult<Self> {
        let spec = Spec::from_value(loaded.document, loaded.origin.as_deref(), options)?;
        Ok(Self::new(Arc::new(spec), transport))
    }

    /// Loads a document from a URL or path and dispatches over HTTP.
    #[cfg(feature = "http")]
    pub async fn from_source(source: &str, options: SpecOptions) -> ClientResult<Self> {
        let loaded = crate::loader::load(source).await?;
        let transport = crate::http::HttpTransport::new()?;
        Self::from_document(loaded, options, Arc::new(transport))
    }

    /// The spec this client calls into.
    pub fn spec(&self) -> &Arc<Spec> {
        &self.spec
    }

    /// Builds and validates the request for an operation.
    ///
    /// Schema and argument errors are returned here; nothing has been sent
    /// until [`PendingCall::result`] is awaited.
    pub fn call<I, K, V>(&self, operation_id: &str, args: I) -> ClientResult<PendingCall>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.call_with_options(operation_id, args, &RequestOptions::default())
    }

    /// Like [`Client::call`], with per-call request options.
    pub fn call_with_options<I, K, V>(
        &self,
        operation_id: &str,
        args: I,
        options: &RequestOptions,
    ) -> ClientResult<PendingCall>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let operation = self.spec.operation(operation_id)?;
        let args: IndexMap<String, Value> = args
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let request = operation.build_request(
            self.spec.marshaller(),
            self.spec.api_url(),
            &args,
            options,
        )?;
        Ok(PendingCall::new(
            Arc::clone(&self.spec),
            Arc::clone(&self.transport),
            operation_id,
            request,
        ))
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("api_url", &self.spec.api_url())
            .field("operations", &self.spec.operations().count())
            .finish()
    }
}
