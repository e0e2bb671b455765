use reqwest::StatusCode;
use serde_json::Value;
use tokio::task::JoinError;

/// An error while loading the GraphQL schema from its source
#[derive(Debug, thiserror::Error)]
pub enum IntrospectionError {
    #[error("Failed to send introspection request to {endpoint}: {source}")]
    Request {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("Introspection request to {endpoint} failed with status {status}")]
    Status { endpoint: String, status: StatusCode },

    #[error("Failed to read introspection response body: {0}")]
    Body(reqwest::Error),

    #[error("Introspection query returned errors: {0}")]
    GraphQL(Value),

    #[error("Malformed introspection result: {0}")]
    Malformed(String),

    #[error("Invalid introspection JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Could not read schema file: {0}")]
    ReadFile(#[from] std::io::Error),

    #[error("Could not parse GraphQL schema: {0}")]
    Sdl(String),
}

/// An error raised while handling a single `tools/call` invocation.
///
/// These never escape the transport: the registry reports them to the caller
/// as error content inside a successful response.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("GraphQL errors: {0}")]
    Execution(Value),

    #[error("GraphQL endpoint returned status {status}: {body}")]
    Transport { status: StatusCode, body: String },

    #[error("Failed to send GraphQL request: {0}")]
    Request(reqwest::Error),

    #[error("Failed to read GraphQL response body: {0}")]
    InvalidResponse(reqwest::Error),

    #[error("Schema unavailable: {0}")]
    Introspection(#[from] IntrospectionError),

    #[error("Failed to serialize tool output: {0}")]
    Output(#[from] serde_json::Error),
}

impl ToolError {
    pub(crate) fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }
}

/// An error in server initialization
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Could not bind server: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to initialize MCP server: {0}")]
    McpInitializeError(String),

    #[error("Failed to start server")]
    StartupError(#[from] JoinError),
}

/// A JSON-RPC level error
pub type McpError = rmcp::model::ErrorData;

/// Schema failures outside of `tools/call` are internal errors at the transport
impl From<IntrospectionError> for McpError {
    fn from(error: IntrospectionError) -> Self {
        McpError::new(
            rmcp::model::ErrorCode::INTERNAL_ERROR,
            "Failed to load the GraphQL schema",
            Some(serde_json::json!({ "detail": error.to_string() })),
        )
    }
}
