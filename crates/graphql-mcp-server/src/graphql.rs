//! Execute synthesized GraphQL operations against the upstream endpoint

use reqwest::header::HeaderMap;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::credential::Credential;
use crate::errors::ToolError;

pub struct Request<'a> {
    pub document: &'a str,
    pub variables: &'a Value,
    pub credential: Option<&'a Credential>,
}

/// Client for the upstream GraphQL endpoint.
///
/// Requests are sent once. Mutations can have side effects, so retrying is
/// left to the caller.
#[derive(Clone)]
pub struct GraphQLClient {
    client: reqwest::Client,
    endpoint: Url,
    headers: HeaderMap,
}

impl GraphQLClient {
    pub fn new(endpoint: Url, headers: HeaderMap) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            headers,
        }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Post an operation and return the response body.
    ///
    /// A non-success status fails before the body is parsed. A response with
    /// any non-empty `errors` value fails with those errors verbatim.
    pub async fn execute(&self, request: Request<'_>) -> Result<Value, ToolError> {
        let mut headers = self.headers.clone();
        if let Some(credential) = request.credential {
            credential.apply(&mut headers);
        }

        debug!(endpoint = %self.endpoint, "Executing GraphQL operation");
        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .json(&json!({
                "query": request.document,
                "variables": request.variables,
            }))
            .send()
            .await
            .map_err(ToolError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|error| {
                debug!(%status, %error, "Failed to read the error response body");
                String::new()
            });
            return Err(ToolError::Transport { status, body });
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(ToolError::InvalidResponse)?;

        match body.get("errors") {
            None | Some(Value::Null) => Ok(body),
            Some(Value::Array(errors)) if errors.is_empty() => Ok(body),
            Some(Value::Object(errors)) if errors.is_empty() => Ok(body),
            Some(errors) => Err(ToolError::Execution(errors.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use http::header::COOKIE;
    use mockito::Matcher;
    use rstest::rstest;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tracing_test::traced_test;

    fn client(server: &mockito::Server) -> GraphQLClient {
        let mut headers = HeaderMap::new();
        headers.insert("x-client", HeaderValue::from_static("mcp"));
        GraphQLClient::new(Url::parse(&server.url()).unwrap(), headers)
    }

    #[tokio::test]
    async fn posts_document_variables_and_credential() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("cookie", "session=abc")
            .match_header("x-client", "mcp")
            .match_body(Matcher::Json(json!({
                "query": "query Ping {\n  ping\n}",
                "variables": { "id": 1 },
            })))
            .with_status(200)
            .with_body(json!({ "data": { "ping": "pong" } }).to_string())
            .expect(1)
            .create_async()
            .await;

        let credential = Credential::new(COOKIE, HeaderValue::from_static("session=abc"));
        let result = client(&server)
            .execute(Request {
                document: "query Ping {\n  ping\n}",
                variables: &json!({ "id": 1 }),
                credential: Some(&credential),
            })
            .await
            .unwrap();

        assert_eq!(result, json!({ "data": { "ping": "pong" } }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn graphql_errors_are_returned_verbatim() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(
                json!({
                    "data": null,
                    "errors": [{ "message": "Not authorized", "path": ["createOrder"] }],
                })
                .to_string(),
            )
            .create_async()
            .await;

        let result = client(&server)
            .execute(Request {
                document: "mutation CreateOrder {\n  createOrder\n}",
                variables: &json!({}),
                credential: None,
            })
            .await;

        match result {
            Err(ToolError::Execution(errors)) => assert_eq!(
                errors,
                json!([{ "message": "Not authorized", "path": ["createOrder"] }])
            ),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_success_status_is_a_transport_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(503)
            .with_body("upstream unavailable")
            .create_async()
            .await;

        let result = client(&server)
            .execute(Request {
                document: "query Ping {\n  ping\n}",
                variables: &json!({}),
                credential: None,
            })
            .await;

        match result {
            Err(ToolError::Transport { status, body }) => {
                assert_eq!(status.as_u16(), 503);
                assert_eq!(body, "upstream unavailable");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn unreadable_error_body_is_logged_and_left_empty() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("http://{}/", listener.local_addr().unwrap())).unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0; 4096];
            let _ = socket.read(&mut request).await.unwrap();
            // Promise more body than is sent, then hang up
            socket
                .write_all(b"HTTP/1.1 502 Bad Gateway\r\ncontent-length: 100\r\n\r\ntruncated")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });

        let result = GraphQLClient::new(url, HeaderMap::new())
            .execute(Request {
                document: "query Ping {\n  ping\n}",
                variables: &json!({}),
                credential: None,
            })
            .await;

        match result {
            Err(ToolError::Transport { status, body }) => {
                assert_eq!(status.as_u16(), 502);
                assert_eq!(body, "");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(logs_contain("Failed to read the error response body"));
    }

    #[rstest]
    #[case(json!({ "message": "Not authorized" }))]
    #[case(json!("Not authorized"))]
    #[tokio::test]
    async fn non_array_errors_are_execution_errors(#[case] errors: Value) {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(json!({ "data": null, "errors": errors }).to_string())
            .create_async()
            .await;

        let result = client(&server)
            .execute(Request {
                document: "query Ping {\n  ping\n}",
                variables: &json!({}),
                credential: None,
            })
            .await;

        match result {
            Err(ToolError::Execution(returned)) => assert_eq!(returned, errors),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[rstest]
    #[case(json!([]))]
    #[case(json!({}))]
    #[case(Value::Null)]
    #[tokio::test]
    async fn empty_errors_are_success(#[case] errors: Value) {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(json!({ "data": { "ping": "pong" }, "errors": errors }).to_string())
            .create_async()
            .await;

        let result = client(&server)
            .execute(Request {
                document: "query Ping {\n  ping\n}",
                variables: &json!({}),
                credential: None,
            })
            .await;

        assert!(result.is_ok());
    }
}
