//! Mastodon Client Library
//!
//! Provides a typed HTTP client for the Mastodon REST API and its streaming
//! timelines.
//!
//! # Example
//!
//! ```rust,no_run
//! use mastodon_client::{Config, MastodonClient, Toot};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::new("https://mastodon.example", "client-id", "client-secret");
//!     let mut client = MastodonClient::new(config)?;
//!
//!     // Password grant; the token is kept by the client
//!     client.authenticate("alice@example.com", "hunter2").await?;
//!
//!     let status = client.post_status(&Toot::new("hello from Rust")).await?;
//!     println!("posted {}", status.id);
//!
//!     for status in client.get_timeline_home().await? {
//!         println!("{}", status.content);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Streaming
//!
//! See the [`streaming`] module. Streams are opened with
//! [`MastodonClient::open_stream`] or one of its per-timeline shorthands and
//! read through an [`EventStream`].
//!
//! # Testing
//!
//! The `testing` module serves an axum router on a local port and hands out a
//! client pointed at it:
//!
//! ```rust,ignore
//! use mastodon_client::testing::TestServer;
//!
//! let server = TestServer::start(router).await?;
//! let timeline = server.client.get_timeline_home().await?;
//! ```

mod client;
mod config;
mod error;
pub mod streaming;
pub mod testing;
mod types;

pub use client::MastodonClient;
pub use config::{AppConfig, Config, DEFAULT_SCOPES, OOB_REDIRECT_URI};
pub use error::{ClientError, Result};
pub use types::*;

// Re-export streaming types for convenience
pub use streaming::{
    CancelToken, DecodeError, Event, EventStream, StreamClosure, StreamEndpoint, StreamError,
};

// Re-export the HTTP method type used by `MastodonClient::send`
pub use reqwest::Method;
