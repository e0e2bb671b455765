//! The upstream GraphQL endpoint, defaulting to the local commerce API

use std::ops::Deref;

use serde::Deserialize;
use url::Url;

/// A GraphQL endpoint
#[derive(Debug, Clone)]
pub struct Endpoint(Url);

impl Endpoint {
    /// Unwrap the endpoint into its inner URL
    pub fn into_inner(self) -> Url {
        self.0
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self(defaults::endpoint())
    }
}

impl<'de> Deserialize<'de> for Endpoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let url = Url::deserialize(deserializer)?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            scheme => Err(serde::de::Error::custom(format!(
                "GraphQL endpoint must use http or https, not {scheme}"
            ))),
        }
    }
}

impl Deref for Endpoint {
    type Target = Url;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

mod defaults {
    use url::Url;

    pub(super) fn endpoint() -> Url {
        // Checked by [test::default_endpoint_parses_correctly]
        #[allow(clippy::unwrap_used)]
        Url::parse("http://127.0.0.1:3000/api/graphql").unwrap()
    }

}
