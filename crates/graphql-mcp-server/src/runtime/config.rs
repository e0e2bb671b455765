use graphql_mcp_server::{health::HealthCheckConfig, server::Transport};
use reqwest::header::{COOKIE, HeaderMap, HeaderName};
use rmcp::model::Implementation;
use schemars::JsonSchema;
use serde::Deserialize;
use url::Url;

use super::{endpoint::Endpoint, logging::Logging, schema_source::SchemaConfig};

/// Configuration for the MCP server
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Config {
    /// The target GraphQL endpoint
    #[schemars(schema_with = "Url::json_schema")]
    pub endpoint: Endpoint,

    /// Name of the inbound request header whose value is forwarded to the
    /// GraphQL endpoint as the caller's credential
    #[serde(deserialize_with = "parsers::header_name")]
    #[schemars(with = "String")]
    pub forward_header: HeaderName,

    /// List of hard-coded headers to include in all GraphQL requests
    #[serde(deserialize_with = "parsers::map_from_str")]
    #[schemars(schema_with = "super::schemas::header_map")]
    pub headers: HeaderMap,

    /// Health check configuration
    pub health_check: HealthCheckConfig,

    /// Logging configuration
    pub logging: Logging,

    /// Where the schema comes from and how long it is cached
    pub schema: SchemaConfig,

    /// Name and version reported to MCP clients
    pub server_info: ServerInfo,

    /// The type of server transport to use
    pub transport: Transport,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: Endpoint::default(),
            forward_header: COOKIE,
            headers: HeaderMap::new(),
            health_check: HealthCheckConfig::default(),
            logging: Logging::default(),
            schema: SchemaConfig::default(),
            server_info: ServerInfo::default(),
            transport: Transport::default(),
        }
    }
}

/// Identity of this server in the `initialize` handshake
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl From<ServerInfo> for Implementation {
    fn from(info: ServerInfo) -> Self {
        Implementation {
            name: info.name,
            version: info.version,
        }
    }
}

mod parsers {
    use std::str::FromStr;

    use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
    use serde::{Deserialize, Deserializer};

    pub(super) fn header_name<'de, D>(deserializer: D) -> Result<HeaderName, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        HeaderName::from_str(&name).map_err(|e| serde::de::Error::custom(e.to_string()))
    }

    pub(super) fn map_from_str<'de, D>(deserializer: D) -> Result<HeaderMap, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct MapFromStrVisitor;
        impl<'de> serde::de::Visitor<'de> for MapFromStrVisitor {
            type Value = HeaderMap;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a map of header string keys and values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut parsed = HeaderMap::with_capacity(map.size_hint().unwrap_or(0));

                while let Some((key, value)) = map.next_entry::<String, String>()? {
                    let key = HeaderName::from_str(&key)
                        .map_err(|e| serde::de::Error::custom(e.to_string()))?;
                    let value = HeaderValue::from_str(&value)
                        .map_err(|e| serde::de::Error::custom(e.to_string()))?;

                    parsed.insert(key, value);
                }

                Ok(parsed)
            }
        }

        deserializer.deserialize_map(MapFromStrVisitor)
    }
}
