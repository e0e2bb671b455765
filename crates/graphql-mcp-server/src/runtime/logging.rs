//! Logging config and utilities
//!
//! Logs always go to a file or to stderr. Stdout is reserved for MCP
//! messages when serving over stdio.

mod defaults;
mod log_rotation_kind;
mod parsers;

use log_rotation_kind::LogRotationKind;
use schemars::JsonSchema;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::Layer;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

const LOG_FILE_PREFIX: &str = "graphql_mcp_server";

/// Logging related options
#[derive(Debug, Deserialize, JsonSchema)]
pub struct Logging {
    /// The log level to use for tracing
    #[serde(
        default = "defaults::log_level",
        deserialize_with = "parsers::from_str"
    )]
    #[schemars(schema_with = "super::schemas::level")]
    pub level: Level,

    /// Directory to write rolling log files to, instead of stderr
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Log file rotation period to use when log file path provided
    /// [default: Hourly]
    #[serde(default = "defaults::default_rotation")]
    pub rotation: LogRotationKind,
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
            path: None,
            rotation: defaults::default_rotation(),
        }
    }
}

type LoggingLayer = Layer<
    tracing_subscriber::Registry,
    tracing_subscriber::fmt::format::DefaultFields,
    tracing_subscriber::fmt::format::Format,
    BoxMakeWriter,
>;

impl Logging {
    /// The configured level, overridable per target through `RUST_LOG`
    pub fn env_filter(logging: &Logging) -> Result<EnvFilter, anyhow::Error> {
        let mut env_filter = EnvFilter::from_default_env().add_directive(logging.level.into());

        if logging.level == Level::INFO {
            env_filter = env_filter.add_directive("rmcp=warn".parse()?);
        }
        Ok(env_filter)
    }

    pub fn logging_layer(logging: &Logging) -> (LoggingLayer, Option<WorkerGuard>) {
        let (writer, guard, with_ansi) = match &logging.path {
            Some(path) => Self::file_writer(path, logging.rotation)
                .map(|(writer, guard)| (writer, Some(guard), false))
                .unwrap_or_else(|| {
                    eprintln!("Log file setup failed - falling back to stderr");
                    (BoxMakeWriter::new(std::io::stderr), None, true)
                }),
            None => (BoxMakeWriter::new(std::io::stderr), None, true),
        };

        (
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(with_ansi)
                .with_target(false),
            guard,
        )
    }

    fn file_writer(
        path: &Path,
        rotation: LogRotationKind,
    ) -> Option<(BoxMakeWriter, WorkerGuard)> {
        std::fs::create_dir_all(path)
            .inspect_err(|e| eprintln!("Failed to create log directory {}: {e}", path.display()))
            .ok()?;

        let appender = RollingFileAppender::builder()
            .rotation(rotation.into())
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix("log")
            .build(path)
            .inspect_err(|e| eprintln!("Failed to build log file appender: {e}"))
            .ok()?;

        let (non_blocking_appender, guard) = tracing_appender::non_blocking(appender);
        Some((BoxMakeWriter::new(non_blocking_appender), guard))
    }
}
