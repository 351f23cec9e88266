//! Types for streaming timelines

use thiserror::Error;

use crate::types::{Notification, Status};

/// One blank-line-terminated record of the event stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Value of the last `event:` line, empty if none was seen
    pub event: String,
    /// Concatenated values of all `data:` lines
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(event: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }
}

/// An event received from a streaming timeline
#[derive(Debug)]
pub enum Event {
    /// A new status appeared on the timeline
    Update(Status),
    /// A notification for the authenticated user
    Notification(Notification),
    /// The status with this id was deleted
    Delete(i64),
    /// Something went wrong while servicing the stream
    Error(StreamError),
}

/// A frame that could not be turned into an [`Event`]
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown event type: {0:?}")]
    UnknownEventType(String),

    #[error("invalid {event} payload: {source}")]
    Json {
        event: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors delivered on the event channel
#[derive(Debug, Error)]
pub enum StreamError {
    /// The connection failed mid-stream
    #[error("Read error: {0}")]
    Read(#[from] reqwest::Error),

    /// I/O failure on the underlying byte source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A single frame could not be decoded; the stream continues
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl StreamError {
    /// Whether the session ended because of this error
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Decode(_))
    }
}

/// How a streaming session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamClosure {
    /// The server closed the response body
    Clean,
    /// Reading the body failed; the error was delivered as the last event
    Error,
    /// The caller cancelled or stopped listening
    Cancelled,
}
