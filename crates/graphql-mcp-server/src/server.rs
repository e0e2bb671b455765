//! The MCP server: JSON-RPC and SSE over HTTP, or MCP over stdio

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderMap, HeaderName};
use axum::routing::{get, post};
use bon::bon;
use rmcp::ServiceExt as _;
use rmcp::model::Implementation;
use rmcp::transport::stdio;
use schemars::JsonSchema;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::credential::Credential;
use crate::errors::ServerError;
use crate::health::{HealthCheck, HealthCheckConfig, health_endpoint};
use crate::registry::ToolRegistry;
use crate::server_handler::{GraphQLMcpServerHandler, default_implementation};

mod jsonrpc;
mod sse;

/// How the server is exposed to MCP clients
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transport {
    /// JSON-RPC requests are POSTed to `path`; a GET on the same path opens
    /// an SSE connectivity stream
    Http {
        /// The IP address to bind to
        #[serde(default = "defaults::address")]
        address: IpAddr,

        /// The port to bind to
        #[serde(default = "defaults::port")]
        port: u16,

        /// The path serving both JSON-RPC and SSE
        #[serde(default = "defaults::path")]
        path: String,

        /// Interval between SSE ping events
        #[serde(default = "defaults::ping_interval", with = "humantime_serde")]
        #[schemars(with = "String")]
        ping_interval: Duration,
    },

    /// MCP over stdin and stdout
    Stdio,
}

impl Default for Transport {
    fn default() -> Self {
        Self::Http {
            address: defaults::address(),
            port: defaults::port(),
            path: defaults::path(),
            ping_interval: defaults::ping_interval(),
        }
    }
}

mod defaults {
    use super::*;

    pub(super) fn address() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    pub(super) fn port() -> u16 {
        5000
    }

    pub(super) fn path() -> String {
        "/mcp".to_string()
    }

    pub(super) fn ping_interval() -> Duration {
        Duration::from_secs(30)
    }
}

/// A GraphQL MCP Server
pub struct Server {
    transport: Transport,
    registry: ToolRegistry,
    forward_header: HeaderName,
    health_check: HealthCheckConfig,
    server_info: Implementation,
}

#[bon]
impl Server {
    #[builder]
    pub fn new(
        transport: Transport,
        registry: ToolRegistry,
        forward_header: HeaderName,
        #[builder(default)] health_check: HealthCheckConfig,
        #[builder(default = default_implementation())] server_info: Implementation,
    ) -> Self {
        Self {
            transport,
            registry,
            forward_header,
            health_check,
            server_info,
        }
    }

    /// The HTTP routes for this server, without binding a listener
    pub fn router(&self) -> Router {
        let (path, ping_interval) = match &self.transport {
            Transport::Http {
                path,
                ping_interval,
                ..
            } => (path.clone(), *ping_interval),
            Transport::Stdio => (defaults::path(), defaults::ping_interval()),
        };
        let state = AppState {
            registry: self.registry.clone(),
            forward_header: self.forward_header.clone(),
            server_info: self.server_info.clone(),
            ping_interval,
        };

        let mut router = Router::new()
            .route(&path, post(jsonrpc::handle).get(sse::handle))
            .with_state(state);

        if self.health_check.enabled {
            let health_check =
                HealthCheck::new(self.health_check.clone(), self.registry.cache().clone());
            let health_router = Router::new()
                .route(&health_check.config().path, get(health_endpoint))
                .with_state(health_check);
            router = router.merge(health_router);
        }

        router.layer(TraceLayer::new_for_http())
    }

    pub async fn start(self) -> Result<(), ServerError> {
        match &self.transport {
            Transport::Http {
                address,
                port,
                path,
                ..
            } => {
                info!(port = ?port, address = ?address, path = %path, "Starting MCP server in HTTP mode");
                let router = self.router();
                let listen_address = SocketAddr::new(*address, *port);
                let listener = tokio::net::TcpListener::bind(listen_address).await?;
                axum::serve(listener, router)
                    .with_graceful_shutdown(shutdown_signal())
                    .await?;
            }
            Transport::Stdio => {
                info!("Starting MCP server in stdio mode");
                let handler = GraphQLMcpServerHandler::new(self.registry, self.server_info);
                let service = handler
                    .serve(stdio())
                    .await
                    .inspect_err(|e| {
                        error!("serving error: {:?}", e);
                    })
                    .map_err(|e| ServerError::McpInitializeError(e.to_string()))?;
                service.waiting().await?;
            }
        }
        info!("MCP server stopped");
        Ok(())
    }
}

/// State shared by the JSON-RPC and SSE handlers
#[derive(Clone)]
struct AppState {
    registry: ToolRegistry,
    forward_header: HeaderName,
    server_info: Implementation,
    ping_interval: Duration,
}

impl AppState {
    fn credential(&self, headers: &HeaderMap) -> Option<Credential> {
        Credential::from_headers(&self.forward_header, headers)
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C signal handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
