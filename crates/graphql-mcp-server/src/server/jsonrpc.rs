//! JSON-RPC 2.0 over HTTP POST
//!
//! Each POST carries one request and gets one response. Failures while
//! parsing or dispatching the request are JSON-RPC errors; failures inside a
//! `tools/call` are tool results flagged as errors, in a successful envelope.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use rmcp::model::{CallToolRequestParam, ErrorCode, ListToolsResult};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::credential::Credential;
use crate::errors::McpError;
use crate::server_handler::{server_info, warm_schema};

use super::AppState;

const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    #[serde(default)]
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, error: McpError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error),
        }
    }
}

pub(super) async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let message: Value = match serde_json::from_slice(&body) {
        Ok(message) => message,
        Err(e) => {
            return reject(
                Value::Null,
                McpError::new(ErrorCode::PARSE_ERROR, format!("Parse error: {e}"), None),
            );
        }
    };

    // Echo the id back even when the rest of the envelope is unusable
    let id = message.get("id").cloned().unwrap_or(Value::Null);
    let request = match serde_json::from_value::<JsonRpcRequest>(message) {
        Ok(request) if request.jsonrpc == JSONRPC_VERSION => request,
        Ok(request) => {
            return reject(
                id,
                McpError::new(
                    ErrorCode::INVALID_REQUEST,
                    format!("Unsupported JSON-RPC version: {}", request.jsonrpc),
                    None,
                ),
            );
        }
        Err(e) => {
            return reject(
                id,
                McpError::new(ErrorCode::INVALID_REQUEST, format!("Invalid request: {e}"), None),
            );
        }
    };

    let Some(id) = request.id else {
        // Notifications never get a response body
        debug!(method = %request.method, "Received notification");
        return StatusCode::ACCEPTED.into_response();
    };

    let credential = state.credential(&headers);
    let response = match dispatch(&state, &request.method, request.params, credential.as_ref())
        .await
    {
        Ok(result) => JsonRpcResponse::success(id, result),
        Err(error) => {
            debug!(method = %request.method, code = error.code.0, "JSON-RPC error: {}", error.message);
            JsonRpcResponse::error(id, error)
        }
    };
    Json(response).into_response()
}

async fn dispatch(
    state: &AppState,
    method: &str,
    params: Option<Value>,
    credential: Option<&Credential>,
) -> Result<Value, McpError> {
    match method {
        "initialize" => {
            warm_schema(&state.registry, credential).await;
            to_result(server_info(state.server_info.clone()))
        }
        "notifications/initialized" | "ping" => Ok(json!({})),
        "tools/list" => {
            let tools = state.registry.list_tools(credential).await?;
            debug!(count = tools.len(), "Listing tools");
            to_result(ListToolsResult {
                next_cursor: None,
                tools,
            })
        }
        "tools/call" => {
            let params: CallToolRequestParam = params
                .ok_or_else(|| McpError::invalid_params("Missing params for tools/call", None))
                .and_then(|params| {
                    serde_json::from_value(params).map_err(|e| {
                        McpError::invalid_params(format!("Invalid params for tools/call: {e}"), None)
                    })
                })?;
            to_result(
                state
                    .registry
                    .call_tool(&params.name, params.arguments, credential)
                    .await,
            )
        }
        other => {
            warn!(method = %other, "Unknown JSON-RPC method");
            Err(McpError::new(
                ErrorCode::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
                None,
            ))
        }
    }
}

fn to_result(result: impl Serialize) -> Result<Value, McpError> {
    serde_json::to_value(result).map_err(|e| {
        McpError::new(
            ErrorCode::INTERNAL_ERROR,
            "Failed to serialize the response",
            Some(json!({ "detail": e.to_string() })),
        )
    })
}

/// Envelope-level failures, where the request never reached dispatch
fn reject(id: Value, error: McpError) -> Response {
    warn!(code = error.code.0, "Rejected JSON-RPC request: {}", error.message);
    (StatusCode::BAD_REQUEST, Json(JsonRpcResponse::error(id, error))).into_response()
}
