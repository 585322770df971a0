#![deny(missing_docs)]

//! # Operations Command
//!
//! Lists the operations of a document grouped by resource, and describes the
//! parameters and responses of a single operation.

use crate::error::CliResult;
use crate::source::SourceArgs;
use schema_client_core::schema::types::wire_type;
use schema_client_core::{Operation, Spec, WireType};
use std::fmt::Write;

/// Arguments for the `describe` command.
#[derive(clap::Args, Debug, Clone)]
pub struct DescribeArgs {
    /// Operation id to describe.
    pub operation: String,
}

/// Prints every operation grouped by resource.
pub async fn list(source: &SourceArgs) -> CliResult<()> {
    let spec = source.spec().await?;
    print!("{}", render_listing(&spec));
    Ok(())
}

/// Prints the parameters and responses of one operation.
pub async fn describe(source: &SourceArgs, args: &DescribeArgs) -> CliResult<()> {
    let spec = source.spec().await?;
    let op = spec.operation(&args.operation)?;
    print!("{}", render_operation(&spec, op)?);
    Ok(())
}

fn render_listing(spec: &Spec) -> String {
    let mut out = String::new();
    for (resource, operations) in spec.resources() {
        let _ = writeln!(out, "{}", resource);
        for op in operations {
            let _ = writeln!(out, "  {:<28} {:<7} {}", op.id(), op.method().as_str(), op.path_name());
        }
    }
    out
}

fn render_operation(spec: &Spec, op: &Operation) -> CliResult<String> {
    let mut out = String::new();
    let _ = writeln!(out, "{} {} ({})", op.method(), op.path_name(), op.id());
    let _ = writeln!(out, "parameters:");
    for param in op.params() {
        let ty = wire_type(spec.graph(), param.definition)?;
        let mut line = format!("  {} [{}] {}", param.name, param.location, ty);
        if matches!(ty, WireType::Array(_)) {
            let _ = write!(line, " ({})", param.collection_format);
        }
        if param.required {
            line.push_str(" (required)");
        }
        if let Some(default) = &param.default {
            let _ = write!(line, " = {}", default);
        }
        let _ = writeln!(out, "{}", line);
    }
    let _ = writeln!(out, "responses:");
    for response in op.responses().values() {
        let ty = match response.schema {
            Some(id) => wire_type(spec.graph(), id)?.to_string(),
            None => "-".to_string(),
        };
        let _ = writeln!(out, "  {} {}", response.status, ty);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schema_client_core::SpecOptions;
    use serde_json::json;

    fn spec() -> Spec {
        let doc = json!({
            "swagger": "2.0",
            "definitions": {
                "Pet": {"type": "object", "properties": {"name": {"type": "string"}}}
            },
            "paths": {
                "/pet/{petId}": {
                    "get": {
                        "tags": ["pet"],
                        "operationId": "getPetById",
                        "parameters": [
                            {"name": "petId", "in": "path", "required": true, "type": "integer", "format": "int64"},
                            {"name": "verbose", "in": "query", "type": "boolean", "default": false},
                            {"name": "fields", "in": "query", "type": "array", "items": {"type": "string"},
                             "collectionFormat": "pipes"}
                        ],
                        "responses": {
                            "200": {"schema": {"$ref": "#/definitions/Pet"}},
                            "404": {}
                        }
                    }
                },
                "/health": {"get": {"responses": {"200": {}}}}
            }
        });
        Spec::from_value(doc, None, SpecOptions::default()).unwrap()
    }

    #[test]
    fn test_listing_groups_by_resource() {
        let listing = render_listing(&spec());
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "pet");
        assert!(lines[1].contains("getPetById"));
        assert!(lines[1].contains("/pet/{petId}"));
        assert_eq!(lines[2], "default");
        assert!(lines[3].contains("get_health"));
    }

    #[test]
    fn test_describe_shows_types_and_defaults() {
        let spec = spec();
        let op = spec.operation("getPetById").unwrap();
        let text = render_operation(&spec, op).unwrap();
        assert!(text.contains("petId [path] int64 (required)"));
        assert!(text.contains("verbose [query] boolean = false"));
        assert!(text.contains("fields [query] array<string> (pipes)"));
        assert!(text.contains("200 Pet"));
        assert!(text.contains("404 -"));
    }
}
