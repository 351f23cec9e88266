//! Streaming timelines
//!
//! The server pushes timeline activity over a long-lived HTTP response using
//! a minimal text event framing:
//!
//! ```text
//! event: update
//! data: {"id":"1","content":"<p>hello</p>"}
//!
//! ```
//!
//! [`parser`] turns the body into frames, [`decoder`] turns frames into
//! [`Event`]s and [`session`] runs the whole pipeline on a background task.
//!
//! # Example
//!
//! ```no_run
//! use mastodon_client::{CancelToken, Config, Event, MastodonClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new("https://mastodon.example", "id", "secret")
//!     .with_access_token("token");
//! let client = MastodonClient::new(config)?;
//!
//! let cancel = CancelToken::new();
//! let mut events = client.stream_public(&cancel).await?;
//!
//! while let Some(event) = events.recv().await {
//!     match event {
//!         Event::Update(status) => println!("{}", status.content),
//!         Event::Notification(n) => println!("notification: {}", n.notification_type),
//!         Event::Delete(id) => println!("deleted {}", id),
//!         Event::Error(e) => eprintln!("stream error: {}", e),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod decoder;
pub mod parser;
pub mod session;
mod types;

pub use decoder::decode;
pub use parser::{frames, FrameReader};
pub use session::{CancelToken, EventStream, StreamEndpoint, EVENT_CHANNEL_CAPACITY};
pub use types::{DecodeError, Event, Frame, StreamClosure, StreamError};
