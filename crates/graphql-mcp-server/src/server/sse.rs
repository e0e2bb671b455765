//! Server-Sent Events connectivity channel
//!
//! A GET on the MCP path opens a stream that announces the connection and
//! then pings on a fixed interval. No tool traffic flows over it.

use std::convert::Infallible;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::{Event, Sse};
use futures::{Stream, StreamExt as _, stream};
use serde_json::json;
use tokio::time::{Instant, interval_at};
use tokio_stream::wrappers::IntervalStream;
use tracing::info;

use super::AppState;

/// Logs when the client goes away and the stream, with its timer, is dropped
struct Connection {
    has_credential: bool,
}

impl Drop for Connection {
    fn drop(&mut self) {
        info!(has_credential = self.has_credential, "SSE client disconnected");
    }
}

pub(super) async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let has_credential = state.credential(&headers).is_some();
    info!(has_credential, "SSE client connected");

    let connect = Event::default()
        .event("connect")
        .data(json!({ "status": "connected", "hasCredential": has_credential }).to_string());

    let connection = Connection { has_credential };
    let timer = interval_at(Instant::now() + state.ping_interval, state.ping_interval);
    let pings = IntervalStream::new(timer).map(move |_| {
        let _connection = &connection;
        Ok(ping())
    });

    Sse::new(stream::once(async move { Ok(connect) }).chain(pings))
}

fn ping() -> Event {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    Event::default()
        .event("ping")
        .data(json!({ "timestamp": timestamp }).to_string())
}

#[cfg(test)]
mod tests {
    use super::super::Transport;
    use super::super::tests::server;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use futures::StreamExt as _;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;
    use tower::ServiceExt as _;

    async fn frames(cookie: Option<&str>) -> impl futures::Stream<Item = String> {
        let router = server(Transport::Http {
            address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
            path: "/mcp".to_string(),
            ping_interval: Duration::from_secs(10),
        })
        .router();

        let mut request = Request::builder().uri("/mcp");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = router
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        response
            .into_body()
            .into_data_stream()
            .map(|chunk| String::from_utf8(chunk.unwrap().to_vec()).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn announces_the_connection_then_pings() {
        let mut frames = Box::pin(frames(Some("session=abc")).await);

        let connect = frames.next().await.unwrap();
        assert!(connect.starts_with("event: connect\n"));
        assert!(connect.contains(r#""hasCredential":true"#));
        assert!(connect.contains(r#""status":"connected""#));

        let ping = frames.next().await.unwrap();
        assert!(ping.starts_with("event: ping\n"));
        assert!(ping.contains(r#""timestamp":"#));
    }

    #[tokio::test]
    async fn reports_a_missing_credential() {
        let mut frames = Box::pin(frames(None).await);

        let connect = frames.next().await.unwrap();
        assert!(connect.contains(r#""hasCredential":false"#));
    }
}
