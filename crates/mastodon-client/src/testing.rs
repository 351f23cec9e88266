//! Test utilities for mastodon-client
//!
//! Serves a mock API router on a local port so client calls can be exercised
//! end to end.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use tokio::net::TcpListener;

use crate::{Config, MastodonClient, Result};

/// Client id handed to clients created by [`TestServer`]
pub const TEST_CLIENT_ID: &str = "foo";
/// Client secret handed to clients created by [`TestServer`]
pub const TEST_CLIENT_SECRET: &str = "bar";

/// A test server that automatically shuts down when dropped
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: MastodonClient,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    /// Create a new test server from an axum Router
    ///
    /// The client carries the test application credentials and no token.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use axum::{routing::get, Router};
    /// use mastodon_client::testing::TestServer;
    ///
    /// let router = Router::new().route("/api/v1/timelines/home", get(|| async { "[]" }));
    /// let server = TestServer::start(router).await?;
    ///
    /// let timeline = server.client.get_timeline_home().await?;
    /// ```
    pub async fn start<S>(router: axum::Router<S>) -> Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        Self::start_with_timeout(router, Duration::from_secs(5), Duration::from_secs(2)).await
    }

    /// Create a new test server with custom timeouts
    pub async fn start_with_timeout<S>(
        router: axum::Router<S>,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self>
    where
        S: Clone + Send + Sync + 'static,
        axum::Router<S>: Into<axum::Router>,
    {
        // Bind to any available port
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

        let router: axum::Router = router.into();

        // Spawn the server
        let handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // Give server a moment to start
        tokio::time::sleep(Duration::from_millis(10)).await;

        let config = Config::new(
            format!("http://{}", addr),
            TEST_CLIENT_ID,
            TEST_CLIENT_SECRET,
        );
        let client = MastodonClient::with_timeouts(config, timeout, connect_timeout)?;

        Ok(Self {
            addr,
            client,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        })
    }

    /// Get the base URL of the test server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get a reference to the client
    pub fn client(&self) -> &MastodonClient {
        &self.client
    }

    /// A client for this server using the given access token
    pub fn client_with_token(&self, token: &str) -> Result<MastodonClient> {
        let config = Config::new(self.base_url(), TEST_CLIENT_ID, TEST_CLIENT_SECRET)
            .with_access_token(token);
        MastodonClient::new(config)
    }

    /// Shutdown the server gracefully
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        // Send shutdown signal if not already done
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        // Abort the task if still running
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Response body that sends each chunk separately, then ends
pub fn event_stream_body<I, T>(chunks: I) -> Body
where
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
    T: Into<Bytes>,
{
    Body::from_stream(stream::iter(chunks).map(|c| Ok::<_, Infallible>(c.into())))
}

/// Response body that sends each chunk separately, then stays open
pub fn open_event_stream_body<I, T>(chunks: I) -> Body
where
    I: IntoIterator<Item = T>,
    I::IntoIter: Send + 'static,
    T: Into<Bytes>,
{
    Body::from_stream(
        stream::iter(chunks)
            .map(|c| Ok::<_, Infallible>(c.into()))
            .chain(stream::pending()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_server_serves_router() {
        let router = axum::Router::new().route("/health", get(|| async { "OK" }));
        let server = TestServer::start(router).await.unwrap();

        let body = reqwest::get(format!("{}/health", server.base_url()))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();

        assert_eq!(body, "OK");
        assert_eq!(
            server.client().base_url().as_str(),
            format!("{}/", server.base_url())
        );
        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_event_stream_body_chunks() {
        let router = axum::Router::new().route(
            "/stream",
            get(|| async {
                event_stream_body(vec![
                    String::from("event: update\n"),
                    String::from("data: 1\n\n"),
                ])
            }),
        );
        let server = TestServer::start(router).await.unwrap();

        let mut chunks = reqwest::get(format!("{}/stream", server.base_url()))
            .await
            .unwrap()
            .bytes_stream();
        let mut body = Vec::new();
        while let Some(chunk) = chunks.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }

        assert_eq!(body, b"event: update\ndata: 1\n\n");
    }
}
