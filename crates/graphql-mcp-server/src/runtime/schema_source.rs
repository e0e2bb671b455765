use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use graphql_mcp_server::schema_cache::{
    DEFAULT_TTL, IntrospectionFetcher, LocalSchemaFetcher, SchemaFetcher,
};
use reqwest::header::HeaderMap;
use schemars::JsonSchema;
use serde::Deserialize;

/// Source for upstream GraphQL schema
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SchemaSource {
    /// Introspect the configured endpoint
    #[default]
    Introspect,

    /// Read SDL from `path` instead of introspecting
    Local,
}

/// Schema loading options
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SchemaConfig {
    /// Where the schema comes from
    pub source: SchemaSource,

    /// The SDL file to read when the source is `local`
    pub path: Option<PathBuf>,

    /// How long a fetched schema is served before it is fetched again
    #[serde(with = "humantime_serde")]
    #[schemars(with = "String")]
    pub ttl: Duration,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            source: SchemaSource::default(),
            path: None,
            ttl: DEFAULT_TTL,
        }
    }
}

impl SchemaConfig {
    /// The fetcher that refills the schema cache from the configured source
    pub fn fetcher(&self, headers: HeaderMap) -> anyhow::Result<Arc<dyn SchemaFetcher>> {
        match (self.source, &self.path) {
            (SchemaSource::Introspect, _) => Ok(Arc::new(IntrospectionFetcher::new(headers))),
            (SchemaSource::Local, Some(path)) => Ok(Arc::new(LocalSchemaFetcher::new(path.clone()))),
            (SchemaSource::Local, None) => bail!("schema.path is required for a local schema"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_defaults_to_introspection_for_a_day() {
        let config: SchemaConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.source, SchemaSource::Introspect);
        assert_eq!(config.ttl, Duration::from_secs(24 * 60 * 60));
        assert!(config.fetcher(HeaderMap::new()).is_ok());
    }

    #[test]
    fn it_parses_a_local_source() {
        let config: SchemaConfig =
            serde_json::from_str(r#"{ "source": "local", "path": "schema.graphql", "ttl": "1h" }"#)
                .unwrap();

        assert_eq!(config.source, SchemaSource::Local);
        assert_eq!(config.path, Some(PathBuf::from("schema.graphql")));
        assert_eq!(config.ttl, Duration::from_secs(3600));
        assert!(config.fetcher(HeaderMap::new()).is_ok());
    }

    #[test]
    fn it_requires_a_path_for_local_schemas() {
        let config: SchemaConfig = serde_json::from_str(r#"{ "source": "local" }"#).unwrap();

        assert!(config.fetcher(HeaderMap::new()).is_err());
    }
}
