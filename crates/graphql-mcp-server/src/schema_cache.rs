//! Process-wide cache of the upstream GraphQL schema
//!
//! The cache holds a single entry keyed by endpoint identity. An entry is reused
//! while it is younger than the TTL and was fetched from the same endpoint;
//! otherwise the schema is fetched again and the entry replaced as a whole.
//! Concurrent refreshes race and the last writer wins.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use crate::credential::Credential;
use crate::errors::IntrospectionError;
use crate::schema::{GraphQLSchema, INTROSPECTION_QUERY};

/// Schema changes require a deployment upstream, so a long validity window is fine
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A source of schemas for the cache
#[async_trait]
pub trait SchemaFetcher: Send + Sync {
    async fn fetch(
        &self,
        endpoint: &Url,
        credential: Option<&Credential>,
    ) -> Result<GraphQLSchema, IntrospectionError>;
}

/// Fetches the schema by running the introspection query against the endpoint
pub struct IntrospectionFetcher {
    client: reqwest::Client,
    headers: HeaderMap,
}

impl IntrospectionFetcher {
    pub fn new(headers: HeaderMap) -> Self {
        Self {
            client: reqwest::Client::new(),
            headers,
        }
    }
}

#[async_trait]
impl SchemaFetcher for IntrospectionFetcher {
    async fn fetch(
        &self,
        endpoint: &Url,
        credential: Option<&Credential>,
    ) -> Result<GraphQLSchema, IntrospectionError> {
        let mut headers = self.headers.clone();
        if let Some(credential) = credential {
            credential.apply(&mut headers);
        }

        debug!(%endpoint, "Sending introspection query");
        let response = self
            .client
            .post(endpoint.clone())
            .headers(headers)
            .json(&json!({ "query": INTROSPECTION_QUERY }))
            .send()
            .await
            .map_err(|source| IntrospectionError::Request {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(IntrospectionError::Status {
                endpoint: endpoint.to_string(),
                status,
            });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(IntrospectionError::Body)?;
        GraphQLSchema::from_introspection(body)
    }
}

/// Reads the schema from a local SDL file instead of introspecting
pub struct LocalSchemaFetcher {
    path: PathBuf,
}

impl LocalSchemaFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SchemaFetcher for LocalSchemaFetcher {
    async fn fetch(
        &self,
        _endpoint: &Url,
        _credential: Option<&Credential>,
    ) -> Result<GraphQLSchema, IntrospectionError> {
        debug!(path = %self.path.display(), "Reading schema file");
        let sdl = tokio::fs::read_to_string(&self.path).await?;
        GraphQLSchema::from_sdl(&sdl, &self.path.to_string_lossy())
    }
}

/// A schema together with where and when it was fetched
#[derive(Debug)]
pub struct CachedSchema {
    pub endpoint: String,
    pub fetched_at: Instant,
    pub schema: Arc<GraphQLSchema>,
}

impl CachedSchema {
    fn is_fresh(&self, endpoint: &str, ttl: Duration) -> bool {
        self.endpoint == endpoint && self.fetched_at.elapsed() < ttl
    }
}

pub struct SchemaCache {
    slot: RwLock<Option<Arc<CachedSchema>>>,
    loaded: AtomicBool,
    ttl: Duration,
    fetcher: Arc<dyn SchemaFetcher>,
}

impl SchemaCache {
    pub fn new(fetcher: Arc<dyn SchemaFetcher>, ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            loaded: AtomicBool::new(false),
            ttl,
            fetcher,
        }
    }

    /// Get the schema for an endpoint, fetching it when missing or stale.
    ///
    /// A failed refresh falls back to the previous entry, even when that entry
    /// is stale or belongs to another endpoint. The error only propagates when
    /// nothing has ever been cached.
    pub async fn get(
        &self,
        endpoint: &Url,
        credential: Option<&Credential>,
    ) -> Result<Arc<GraphQLSchema>, IntrospectionError> {
        let current = self.slot.read().await.clone();
        if let Some(cached) = current
            .as_ref()
            .filter(|cached| cached.is_fresh(endpoint.as_str(), self.ttl))
        {
            return Ok(cached.schema.clone());
        }

        match self.fetcher.fetch(endpoint, credential).await {
            Ok(schema) => {
                let schema = Arc::new(schema);
                let entry = Arc::new(CachedSchema {
                    endpoint: endpoint.to_string(),
                    fetched_at: Instant::now(),
                    schema: schema.clone(),
                });
                *self.slot.write().await = Some(entry);
                self.loaded.store(true, Ordering::SeqCst);
                info!(%endpoint, "Cached GraphQL schema");
                Ok(schema)
            }
            Err(error) => match current {
                Some(stale) => {
                    warn!(%endpoint, %error, "Schema refresh failed, serving the cached schema");
                    Ok(stale.schema.clone())
                }
                None => Err(error),
            },
        }
    }

    /// Whether a schema has been cached at least once
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct CountingFetcher {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait]
    impl SchemaFetcher for CountingFetcher {
        async fn fetch(
            &self,
            _endpoint: &Url,
            _credential: Option<&Credential>,
        ) -> Result<GraphQLSchema, IntrospectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(IntrospectionError::Malformed("upstream down".to_string()))
            } else {
                GraphQLSchema::from_sdl("type Query { ping: String }", "schema.graphql")
            }
        }
    }

    fn cache() -> (Arc<CountingFetcher>, SchemaCache) {
        let fetcher = Arc::new(CountingFetcher::default());
        let cache = SchemaCache::new(fetcher.clone(), DEFAULT_TTL);
        (fetcher, cache)
    }

    fn endpoint(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn reuses_the_schema_within_the_ttl() {
        let (fetcher, cache) = cache();
        let endpoint = endpoint("http://localhost:3000/api/graphql");

        let first = cache.get(&endpoint, None).await.unwrap();
        tokio::time::advance(Duration::from_secs(60 * 60)).await;
        let second = cache.get(&endpoint, None).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_loaded());
    }

    #[tokio::test(start_paused = true)]
    async fn refetches_once_the_ttl_expires() {
        let (fetcher, cache) = cache();
        let endpoint = endpoint("http://localhost:3000/api/graphql");

        let first = cache.get(&endpoint, None).await.unwrap();
        tokio::time::advance(DEFAULT_TTL).await;
        let second = cache.get(&endpoint, None).await.unwrap();
        let third = cache.get(&endpoint, None).await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&second, &third));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn refetches_when_the_endpoint_changes() {
        let (fetcher, cache) = cache();

        cache
            .get(&endpoint("http://localhost:3000/api/graphql"), None)
            .await
            .unwrap();
        cache
            .get(&endpoint("http://localhost:4000/graphql"), None)
            .await
            .unwrap();

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn serves_a_stale_schema_when_refresh_fails() {
        let (fetcher, cache) = cache();
        let endpoint = endpoint("http://localhost:3000/api/graphql");

        let first = cache.get(&endpoint, None).await.unwrap();
        fetcher.failing.store(true, Ordering::SeqCst);
        tokio::time::advance(DEFAULT_TTL + Duration::from_secs(1)).await;
        let second = cache.get(&endpoint, None).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
        assert!(logs_contain("Schema refresh failed, serving the cached schema"));
    }

    #[tokio::test]
    async fn propagates_failure_when_nothing_is_cached() {
        let (fetcher, cache) = cache();
        fetcher.failing.store(true, Ordering::SeqCst);

        let result = cache
            .get(&endpoint("http://localhost:3000/api/graphql"), None)
            .await;

        assert!(matches!(result, Err(IntrospectionError::Malformed(_))));
        assert!(!cache.is_loaded());
    }

    #[tokio::test]
    async fn introspects_the_endpoint_with_the_credential() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("cookie", "session=abc")
            .match_header("x-static", "yes")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "data": {
                        "__schema": {
                            "queryType": { "name": "Query" },
                            "mutationType": null,
                            "types": [{
                                "kind": "OBJECT",
                                "name": "Query",
                                "fields": [{
                                    "name": "ping",
                                    "args": [],
                                    "type": { "kind": "SCALAR", "name": "String", "ofType": null }
                                }]
                            }]
                        }
                    }
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let mut headers = HeaderMap::new();
        headers.insert("x-static", "yes".parse().unwrap());
        let fetcher = IntrospectionFetcher::new(headers);
        let credential = Credential::new(
            http::header::COOKIE,
            http::HeaderValue::from_static("session=abc"),
        );

        let schema = fetcher
            .fetch(
                &endpoint(&format!("{}/graphql", server.url())),
                Some(&credential),
            )
            .await
            .unwrap();

        assert!(schema.find_root_field("ping").is_some());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn reports_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(502)
            .create_async()
            .await;

        let result = IntrospectionFetcher::new(HeaderMap::new())
            .fetch(&endpoint(&server.url()), None)
            .await;

        assert!(matches!(
            result,
            Err(IntrospectionError::Status { status, .. }) if status.as_u16() == 502
        ));
    }
}
