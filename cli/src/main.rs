#![deny(missing_docs)]

//! # Schema Client CLI
//!
//! Command Line Interface over a Swagger/OpenAPI document.
//!
//! Supported Commands:
//! - `operations`: Lists the operations of the document grouped by resource.
//! - `describe`: Shows the parameters and responses of one operation.
//! - `call`: Invokes an operation and prints the decoded result as JSON.

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;
use crate::source::SourceArgs;

mod call;
mod error;
mod operations;
mod source;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Schema-driven API client")]
struct Cli {
    #[clap(flatten)]
    source: SourceArgs,

    /// Log filter (e.g. `debug`, `schema_client_core=trace`). Falls back to
    /// `RUST_LOG`, then `warn`.
    #[clap(long, global = true)]
    log_level: Option<String>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lists the operations of the document grouped by resource.
    Operations,
    /// Shows the parameters and responses of one operation.
    Describe(operations::DescribeArgs),
    /// Invokes an operation.
    Call(call::CallArgs),
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    match &cli.command {
        Commands::Operations => operations::list(&cli.source).await?,
        Commands::Describe(args) => operations::describe(&cli.source, args).await?,
        Commands::Call(args) => call::execute(&cli.source, args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_call_arguments() {
        let cli = Cli::parse_from([
            "schema-client",
            "--spec",
            "petstore.json",
            "--header",
            "api_key: secret",
            "call",
            "getPetById",
            "petId=12",
            "--request-header",
            "X-Trace: 1",
        ]);
        assert_eq!(cli.source.spec, "petstore.json");
        assert_eq!(
            cli.source.headers,
            vec![("api_key".to_string(), "secret".to_string())]
        );
        let Commands::Call(args) = cli.command else {
            panic!("expected call");
        };
        assert_eq!(args.operation, "getPetById");
        assert_eq!(args.args, vec![("petId".to_string(), "12".to_string())]);
        assert_eq!(
            args.request_headers,
            vec![("X-Trace".to_string(), "1".to_string())]
        );
    }
}
