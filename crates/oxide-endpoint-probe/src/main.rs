//! oxide-endpoint-probe CLI
//!
//! Loads a JSON route table and answers "which route handles this URL?" and
//! "what URL does this named endpoint produce?".

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

use oxide_endpoint::{EndpointMatch, Method, RouteArgs, RouteTable, Router, RouterError};

/// Match and build URLs against a route table.
#[derive(Parser)]
#[command(name = "oxide-endpoint-probe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Route table (JSON).
    #[arg(short, long, env = "OXIDE_ROUTE_TABLE", default_value = "routes.json")]
    table: PathBuf,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the route that handles a request.
    Match {
        /// Request method.
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request URL, absolute or origin-relative.
        url: String,
    },

    /// Build the URL of a named endpoint.
    Url {
        /// Endpoint name.
        name: String,

        /// Parameters as a JSON object.
        #[arg(short, long, default_value = "{}")]
        params: String,

        /// Host to build an absolute URL against.
        #[arg(long)]
        host: Option<String>,
    },

    /// List the endpoints of the table in routing order.
    List,
}

/// What the probe reports for a matched request.
#[derive(Serialize)]
struct Hit {
    route: usize,
    name: Option<String>,
    pattern: String,
    params: Value,
    rest: Value,
}

fn hit(route: usize, name: Option<String>, pattern: String, matched: &EndpointMatch) -> Hit {
    let rest = matched
        .rest
        .iter()
        .map(|(k, v)| (k.to_string(), v.map_or(Value::Null, |v| Value::String(v.to_string()))))
        .collect();
    Hit {
        route,
        name,
        pattern,
        params: serde_json::to_value(&matched.params).unwrap_or_default(),
        rest: Value::Object(rest),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::TRACE
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let table = RouteTable::from_path(&cli.table)
        .with_context(|| format!("loading route table {}", cli.table.display()))?;
    debug!(endpoints = table.endpoints.len(), "route table loaded");

    match cli.command {
        Commands::Match { method, url } => {
            let method: Method = method.parse()?;
            let mut position = 0;
            let router = table.register(Router::new(), |decl| {
                let route = position;
                position += 1;
                let name = decl.name.clone();
                let pattern = decl.pattern.clone();
                move |args: RouteArgs<()>| {
                    let found = hit(route, name.clone(), pattern.clone(), &args.matched);
                    async move { found }
                }
            })?;

            match router.dispatch(method, &url).await {
                Ok(found) => println!("{}", serde_json::to_string_pretty(&found)?),
                Err(RouterError::NotFound { .. }) => {
                    info!(%method, %url, "no route matched");
                    std::process::exit(1);
                }
                Err(err) => return Err(err.into()),
            }
        }

        Commands::Url { name, params, host } => {
            let params: Value = serde_json::from_str(&params).context("parsing --params")?;
            let router: Router = table.register(Router::new(), |_| |_: RouteArgs<()>| async {})?;
            println!("{}", router.url_for(&name, &params, host.as_deref())?);
        }

        Commands::List => {
            for (position, (method, endpoint)) in table.endpoints()?.iter().enumerate() {
                let query: Vec<String> = endpoint
                    .query_spec()
                    .iter()
                    .map(|(name, ty)| format!("{name}:{ty}"))
                    .collect();
                println!(
                    "{position:>3} {method:<7} {:<40} {} {}",
                    endpoint.pattern(),
                    endpoint.name().unwrap_or("-"),
                    query.join(",")
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_reports_rest() {
        let endpoint = oxide_endpoint::Endpoint::build("/posts/:id|i", Default::default()).unwrap();
        let matched = endpoint.match_url("/posts/3?x=1&flag").unwrap();
        let found = hit(0, None, endpoint.pattern(), &matched);
        assert_eq!(found.params, serde_json::json!({"id": 3}));
        assert_eq!(found.rest, serde_json::json!({"x": "1", "flag": null}));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["oxide-endpoint-probe", "-t", "r.json", "match", "/posts/1"]).unwrap();
        assert_eq!(cli.table, PathBuf::from("r.json"));
        assert!(matches!(cli.command, Commands::Match { ref method, .. } if method == "GET"));
    }
}
