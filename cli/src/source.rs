#![deny(missing_docs)]

//! # Document Source
//!
//! Global options naming the schema document and how to reach the API, and
//! the logic turning them into a [`Client`].

use crate::error::{CliError, CliResult};
use schema_client_core::loader::load;
use schema_client_core::{Client, HttpTransport, Spec, SpecOptions};
use std::sync::Arc;
use std::time::Duration;

/// Options shared by every command.
#[derive(clap::Args, Debug, Clone)]
pub struct SourceArgs {
    /// Path or http(s) URL of the Swagger/OpenAPI document.
    #[clap(long, env = "SCHEMA_CLIENT_SPEC")]
    pub spec: String,

    /// Overrides the base URL declared by the document.
    #[clap(long, env = "SCHEMA_CLIENT_BASE_URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[clap(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Header sent with every request.
    /// Format: `"Name:Value"`. May be repeated.
    #[clap(long = "header", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,
}

impl SourceArgs {
    /// Loads and resolves the document.
    pub async fn spec(&self) -> CliResult<Spec> {
        let loaded = load(&self.spec).await?;
        let options = SpecOptions {
            api_url: self.base_url.clone(),
        };
        Ok(Spec::from_value(
            loaded.document,
            loaded.origin.as_deref(),
            options,
        )?)
    }

    /// Loads the document and builds an HTTP client for it.
    pub async fn client(&self) -> CliResult<Client> {
        let spec = self.spec().await?;
        let mut builder = HttpTransport::builder().timeout(Duration::from_secs(self.timeout_secs));
        for (name, value) in &self.headers {
            builder = builder.default_header(name, value)?;
        }
        let transport = builder.build()?;
        if spec.api_url().is_empty() {
            return Err(CliError::General(
                "the document does not declare a base URL; pass --base-url".into(),
            ));
        }
        Ok(Client::new(Arc::new(spec), Arc::new(transport)))
    }
}

/// Helper to parse "Name:Value" header arguments.
fn parse_header(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find(':')
        .ok_or_else(|| format!("invalid Name:Value: no `:` found in `{}`", s))?;
    Ok((s[..pos].trim().to_string(), s[pos + 1..].trim().to_string()))
}
