use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, InitializeRequestParam,
    InitializeResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion, ServerCapabilities,
    ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{RoleServer, ServerHandler};
use tracing::warn;

use crate::credential::Credential;
use crate::errors::McpError;
use crate::registry::ToolRegistry;

const INSTRUCTIONS: &str = "Every GraphQL query and mutation is available as a tool. \
    Use searchModels or listAllModels to find types, then lookupInputType, lookupWhereInput \
    and lookupEnumValues to learn the shape of arguments before calling an operation.";

/// The name and version reported to clients when none is configured
pub fn default_implementation() -> Implementation {
    Implementation {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// The `initialize` result shared by every transport
pub fn server_info(implementation: Implementation) -> ServerInfo {
    ServerInfo {
        protocol_version: ProtocolVersion::V_2024_11_05,
        capabilities: ServerCapabilities::builder()
            .enable_tools()
            .enable_tool_list_changed()
            .enable_logging()
            .build(),
        server_info: implementation,
        instructions: Some(INSTRUCTIONS.to_string()),
        ..Default::default()
    }
}

/// Load the schema ahead of the first `tools/list`.
///
/// A failure here is not fatal: the session starts and listing reports the error.
pub(crate) async fn warm_schema(registry: &ToolRegistry, credential: Option<&Credential>) {
    if let Err(error) = registry.schema(credential).await {
        warn!(%error, "Could not load the GraphQL schema during initialize");
    }
}

/// Serves the tool registry over an rmcp transport (stdio)
#[derive(Clone)]
pub struct GraphQLMcpServerHandler {
    registry: ToolRegistry,
    implementation: Implementation,
}

impl GraphQLMcpServerHandler {
    pub fn new(registry: ToolRegistry, implementation: Implementation) -> Self {
        Self {
            registry,
            implementation,
        }
    }
}

impl ServerHandler for GraphQLMcpServerHandler {
    async fn initialize(
        &self,
        _request: InitializeRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<InitializeResult, McpError> {
        warm_schema(&self.registry, None).await;
        Ok(self.get_info())
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            next_cursor: None,
            tools: self.registry.list_tools(None).await?,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self
            .registry
            .call_tool(&request.name, request.arguments, None)
            .await)
    }

    fn get_info(&self) -> ServerInfo {
        server_info(self.implementation.clone())
    }
}
