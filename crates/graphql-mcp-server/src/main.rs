use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use graphql_mcp_server::graphql::GraphQLClient;
use graphql_mcp_server::registry::ToolRegistry;
use graphql_mcp_server::schema_cache::SchemaCache;
use graphql_mcp_server::server::Server;
use runtime::Config;
use tracing::{debug, info};

mod runtime;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the MCP server
#[derive(Debug, clap::Parser)]
#[command(
    version,
    styles = STYLES,
    about = "GraphQL MCP Server - expose every query and mutation of a GraphQL API as an MCP tool",
)]
struct Args {
    /// Path to the config file
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config: Config = match Args::parse().config {
        Some(config_path) => runtime::read_config(config_path)?,
        None => runtime::read_config_from_env()?,
    };

    let _guard = runtime::setup_logging(&config)?;

    info!(
        "GraphQL MCP Server v{} // Licensed under MIT",
        env!("CARGO_PKG_VERSION")
    );
    debug!(
        endpoint = %config.endpoint.as_str(),
        schema_source = ?config.schema.source,
        transport = ?config.transport,
        "Loaded configuration"
    );

    let endpoint = config.endpoint.into_inner();
    let cache = Arc::new(SchemaCache::new(
        config.schema.fetcher(config.headers.clone())?,
        config.schema.ttl,
    ));
    let client = GraphQLClient::new(endpoint, config.headers);

    Ok(Server::builder()
        .transport(config.transport)
        .registry(ToolRegistry::new(cache, client))
        .forward_header(config.forward_header)
        .health_check(config.health_check)
        .server_info(config.server_info.into())
        .build()
        .start()
        .await?)
}
