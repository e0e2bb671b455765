//! The session credential forwarded from an MCP client to the GraphQL endpoint
//!
//! The value is opaque: it is copied from one inbound header and attached to
//! upstream requests unchanged. It is never parsed, validated, or logged.

use std::fmt::{self, Debug, Formatter};

use http::{HeaderMap, HeaderName, HeaderValue};

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    name: HeaderName,
    value: HeaderValue,
}

impl Credential {
    pub fn new(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }

    /// Extract the credential carried by `name` in an inbound request, if any
    pub fn from_headers(name: &HeaderName, headers: &HeaderMap) -> Option<Self> {
        headers
            .get(name)
            .filter(|value| !value.is_empty())
            .map(|value| Self::new(name.clone(), value.clone()))
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.name
    }

    /// Attach the credential to an outbound header map, replacing any static value
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(self.name.clone(), self.value.clone());
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("name", &self.name)
            .field("value", &"<redacted>")
            .finish()
    }
}
