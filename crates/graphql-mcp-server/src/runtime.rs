//! Runtime utilities
//!
//! This module is only used by the binaries and covers loading the
//! configuration and setting up logging.

mod config;
mod endpoint;
mod logging;
mod schema_source;
mod schemas;

use std::path::Path;

pub use config::Config;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use logging::Logging;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Prefix of every environment variable read into the config
const ENV_PREFIX: &str = "GRAPHQL_MCP_";

/// Separator to use when drilling down into nested options in the env figment
const ENV_NESTED_SEPARATOR: &str = "__";

/// Read configuration from environment variables only (when no config file is provided)
#[allow(clippy::result_large_err)]
pub fn read_config_from_env() -> Result<Config, figment::Error> {
    Figment::new()
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .extract()
}

/// Read in a config from a YAML file, filling in any missing values from the environment
#[allow(clippy::result_large_err)]
pub fn read_config(yaml_path: impl AsRef<Path>) -> Result<Config, figment::Error> {
    Figment::new()
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .join(Yaml::file(yaml_path))
        .extract()
}

/// Install the global subscriber, writing to a rolling file when a log path is configured.
///
/// The returned guard flushes buffered file output when dropped.
pub fn setup_logging(config: &Config) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = Logging::env_filter(&config.logging)?;
    let (logging_layer, guard) = Logging::logging_layer(&config.logging);

    tracing_subscriber::registry()
        .with(logging_layer)
        .with(env_filter)
        .try_init()?;

    Ok(guard)
}
