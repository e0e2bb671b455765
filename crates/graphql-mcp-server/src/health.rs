//! Health check for the MCP server
//!
//! Liveness reports the process is serving requests. Readiness additionally
//! requires that a schema has been cached, since no tools can be listed
//! before that. Load balancers and orchestrators probe `<path>?live` and
//! `<path>?ready`.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::schema_cache::SchemaCache;

/// Health status enumeration
#[derive(Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Health response structure
#[derive(Debug, Serialize)]
pub struct Health {
    status: HealthStatus,
}

/// Configuration options for the health check component.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Set to false to disable the health check
    pub enabled: bool,

    /// Optionally set a custom healthcheck path
    /// Defaults to /health
    pub path: String,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/health".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct HealthCheck {
    config: HealthCheckConfig,
    cache: Arc<SchemaCache>,
}

impl HealthCheck {
    pub fn new(config: HealthCheckConfig, cache: Arc<SchemaCache>) -> Self {
        Self { config, cache }
    }

    pub fn config(&self) -> &HealthCheckConfig {
        &self.config
    }

    pub fn get_health_state(&self, query: Option<&str>) -> (Health, StatusCode) {
        let is_ready_probe = query.is_some_and(|query| {
            query.to_ascii_uppercase().starts_with("READY")
        });

        if is_ready_probe && !self.cache.is_loaded() {
            (
                Health {
                    status: HealthStatus::Down,
                },
                StatusCode::SERVICE_UNAVAILABLE,
            )
        } else {
            (
                Health {
                    status: HealthStatus::Up,
                },
                StatusCode::OK,
            )
        }
    }
}

/// Health check endpoint handler
pub(crate) async fn health_endpoint(
    State(health_check): State<HealthCheck>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Health>) {
    let query = params.keys().next().map(|k| k.as_str());
    let (health, status_code) = health_check.get_health_state(query);

    trace!(?health, query = ?query, "health check");

    (status_code, Json(health))
}
