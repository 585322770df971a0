#![deny(missing_docs)]

//! # Call Command
//!
//! Invokes one operation with `NAME=VALUE` arguments and prints the decoded
//! result as JSON.

use crate::error::CliResult;
use crate::source::SourceArgs;
use schema_client_core::{
    DefinitionKind, Marshaller, Operation, Primitive, RequestOptions, Value,
};
use serde_json::Value as JsonValue;
use std::fs;

/// Arguments for the `call` command.
#[derive(clap::Args, Debug, Clone)]
pub struct CallArgs {
    /// Operation id to invoke.
    pub operation: String,

    /// Operation arguments.
    /// Format: `"name=value"`. Values are read as JSON when they parse,
    /// otherwise as text. File parameters take `@path`.
    #[clap(value_parser = parse_key_val)]
    pub args: Vec<(String, String)>,

    /// Header sent with this request only.
    /// Format: `"Name:Value"`.
    #[clap(long = "request-header", value_parser = parse_request_header)]
    pub request_headers: Vec<(String, String)>,
}

/// Executes the call and prints the result.
pub async fn execute(source: &SourceArgs, args: &CallArgs) -> CliResult<()> {
    let client = source.client().await?;
    let spec = client.spec().clone();
    let op = spec.operation(&args.operation)?;
    let marshaller = spec.marshaller();

    let mut values = Vec::with_capacity(args.args.len());
    for (name, raw) in &args.args {
        values.push((name.clone(), convert_argument(&marshaller, op, name, raw)?));
    }

    let mut options = RequestOptions::default();
    for (name, value) in &args.request_headers {
        options = options.header(name, value);
    }

    let pending = client.call_with_options(&args.operation, values, &options)?;
    tracing::info!(
        operation = %pending.operation_id(),
        method = %pending.request().method,
        url = %pending.request().url,
        "sending request"
    );
    if let Some(result) = pending.result().await? {
        println!("{}", serde_json::to_string_pretty(&result.to_json())?);
    }
    Ok(())
}

/// Converts a command line string into a native value for parameter `name`.
///
/// Unknown names are passed through as text; the client rejects them.
fn convert_argument(
    marshaller: &Marshaller<'_>,
    op: &Operation,
    name: &str,
    raw: &str,
) -> CliResult<Value> {
    let Some(param) = op.param(name) else {
        return Ok(Value::String(raw.to_string()));
    };
    if is_file(marshaller, param.definition) {
        return Ok(match raw.strip_prefix('@') {
            Some(path) => Value::Bytes(fs::read(path)?),
            None => Value::String(raw.to_string()),
        });
    }

    let text = JsonValue::String(raw.to_string());
    let parsed = serde_json::from_str::<JsonValue>(raw).unwrap_or_else(|_| text.clone());
    match marshaller.decode(param.definition, &parsed) {
        Ok(value) => Ok(value),
        Err(_) if parsed != text => match marshaller.decode(param.definition, &text) {
            Ok(value) => Ok(value),
            Err(_) => Ok(Value::from_json(&parsed)),
        },
        Err(_) => Ok(Value::from_json(&parsed)),
    }
}

fn is_file(marshaller: &Marshaller<'_>, id: schema_client_core::DefId) -> bool {
    matches!(
        marshaller.graph().deref(id),
        Ok((_, def)) if def.kind == DefinitionKind::Primitive(Primitive::File)
    )
}

/// Helper to parse "key=value" arguments.
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find('=')
        .ok_or_else(|| format!("invalid KEY=value: no `=` found in `{}`", s))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

fn parse_request_header(s: &str) -> Result<(String, String), String> {
    let pos = s
        .find(':')
        .ok_or_else(|| format!("invalid Name:Value: no `:` found in `{}`", s))?;
    Ok((s[..pos].trim().to_string(), s[pos + 1..].trim().to_string()))
}
