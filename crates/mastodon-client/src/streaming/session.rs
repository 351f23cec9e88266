//! Streaming session lifecycle
//!
//! A session owns one live response body. A spawned task reads frames from
//! it, decodes them and hands the events to an [`EventStream`] over a
//! bounded channel. The task ends on end of body, on a read error (after
//! delivering it) or on cancellation, and the channel closes with it.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::decoder::decode;
use super::parser::frames;
use super::types::{Event, StreamClosure, StreamError};

/// Number of decoded events that may wait for the receiver
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Cooperative cancellation signal shared between a caller and its sessions
///
/// Cloning yields a handle to the same signal. `cancel()` is synchronous, so
/// it can be called from signal handlers and other threads.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Signal cancellation to every session holding this token
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Streaming timelines offered by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEndpoint {
    /// Federated public timeline
    Public,
    /// Public timeline restricted to this server
    PublicLocal,
    /// Home timeline and notifications of the authenticated user
    User,
    /// Public statuses carrying a hashtag
    Hashtag(String),
}

impl StreamEndpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Public => "/api/v1/streaming/public",
            Self::PublicLocal => "/api/v1/streaming/public/local",
            Self::User => "/api/v1/streaming/user",
            Self::Hashtag(_) => "/api/v1/streaming/hashtag",
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Hashtag(tag) => vec![("tag", tag.trim_start_matches('#').to_string())],
            _ => Vec::new(),
        }
    }
}

/// Receiving end of a streaming session
///
/// Yields events in the order their frames were completed on the wire and
/// returns `None` once the session is over. Nothing is yielded after the
/// session's [`CancelToken`] has been cancelled, even if events were already
/// queued. Dropping the stream stops the session and releases the connection.
#[derive(Debug)]
pub struct EventStream {
    receiver: mpsc::Receiver<Event>,
    cancel: CancelToken,
    handle: Option<JoinHandle<StreamClosure>>,
}

impl EventStream {
    /// Start a session over a live response body
    pub(crate) fn spawn<S, E>(body: S, cancel: CancelToken) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<StreamError> + Send + 'static,
    {
        let (tx, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let handle = tokio::spawn(run_session(body, tx, cancel.clone()));

        Self {
            receiver,
            cancel,
            handle: Some(handle),
        }
    }

    /// A stream that was cancelled before its connection was established
    pub(crate) fn cancelled(cancel: CancelToken) -> Self {
        let (_, receiver) = mpsc::channel(1);
        Self {
            receiver,
            cancel,
            handle: None,
        }
    }

    /// Receive the next event, or `None` once the session has closed
    pub async fn recv(&mut self) -> Option<Event> {
        if self.cancel.is_cancelled() {
            self.receiver.close();
            return None;
        }

        let received = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.receiver.recv() => Some(event),
        };

        match received {
            Some(event) => event,
            None => {
                self.receiver.close();
                None
            }
        }
    }

    /// Stop listening and wait for the session task to finish
    ///
    /// Does not cancel the shared token; other sessions using it keep running.
    pub async fn close(mut self) -> StreamClosure {
        self.receiver.close();
        match self.handle.take() {
            Some(handle) => handle.await.unwrap_or(StreamClosure::Cancelled),
            None => StreamClosure::Cancelled,
        }
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            self.receiver.close();
            return Poll::Ready(None);
        }
        // The session task drops its sender on cancellation, which wakes us.
        self.receiver.poll_recv(cx)
    }
}

async fn run_session<S, E>(body: S, tx: mpsc::Sender<Event>, cancel: CancelToken) -> StreamClosure
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Into<StreamError>,
{
    let reader = frames(body);
    let mut reader = std::pin::pin!(reader);

    let closure = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break StreamClosure::Cancelled,
            _ = tx.closed() => break StreamClosure::Cancelled,
            next = reader.next() => next,
        };

        let (event, terminal) = match next {
            Some(Ok(frame)) => match decode(&frame) {
                Ok(event) => (event, false),
                Err(e) => {
                    warn!("Undecodable stream frame: {}", e);
                    (Event::Error(e.into()), false)
                }
            },
            Some(Err(e)) => (Event::Error(e.into()), true),
            None => break StreamClosure::Clean,
        };

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => break StreamClosure::Cancelled,
            sent = tx.send(event) => sent,
        };

        if sent.is_err() {
            break StreamClosure::Cancelled;
        }
        if terminal {
            break StreamClosure::Error;
        }
    };

    debug!(?closure, "Stream session closed");
    closure
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::streaming::types::DecodeError;

    type Chunk = Result<Bytes, std::io::Error>;

    fn chunks(parts: &[&'static str]) -> Vec<Chunk> {
        parts.iter().map(|p| Ok(Bytes::from_static(p.as_bytes()))).collect()
    }

    async fn collect(mut events: EventStream) -> Vec<Event> {
        let mut out = Vec::new();
        while let Some(event) = events.recv().await {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_events_in_order_then_clean_close() {
        let body = futures::stream::iter(chunks(&[
            "event: update\ndata: {\"content\":\"foo\"}\n\n",
            "event: delete\ndata: 7\n\nevent: update\n",
            "data: {\"content\":\"bar\"}\n\n",
        ]));

        let mut stream = EventStream::spawn(body, CancelToken::new());
        let mut events = Vec::new();
        for _ in 0..3 {
            events.push(stream.recv().await.unwrap());
        }

        assert!(matches!(&events[0], Event::Update(s) if s.content == "foo"));
        assert!(matches!(events[1], Event::Delete(7)));
        assert!(matches!(&events[2], Event::Update(s) if s.content == "bar"));
        assert!(stream.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_clean_closure_is_reported() {
        let body = futures::stream::iter(chunks(&["event: delete\ndata: 1\n\n"]));
        let mut stream = EventStream::spawn(body, CancelToken::new());

        assert!(matches!(stream.recv().await, Some(Event::Delete(1))));
        assert!(stream.recv().await.is_none());
        assert_eq!(stream.close().await, StreamClosure::Clean);
    }

    #[tokio::test]
    async fn test_decode_error_does_not_end_session() {
        let body = futures::stream::iter(chunks(&[
            "event: heartbeat\ndata: {}\n\n",
            "event: update\ndata: {\"oops\"\n\n",
            "event: delete\ndata: 3\n\n",
        ]));

        let events = collect(EventStream::spawn(body, CancelToken::new())).await;

        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            Event::Error(StreamError::Decode(DecodeError::UnknownEventType(e))) if e == "heartbeat"
        ));
        assert!(matches!(&events[1], Event::Error(e) if !e.is_terminal()));
        assert!(matches!(events[2], Event::Delete(3)));
    }

    #[tokio::test]
    async fn test_partial_trailing_frame_yields_nothing() {
        let body = futures::stream::iter(chunks(&[
            "event: delete\ndata: 1\n\n",
            "event: update\ndata: {\"content\":\"never\"}",
        ]));

        let events = collect(EventStream::spawn(body, CancelToken::new())).await;

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Event::Delete(1)));
    }

    #[tokio::test]
    async fn test_empty_label_or_data_frame_is_reported() {
        let body = futures::stream::iter(chunks(&[
            "event:\n\n",
            "data:\n\n",
            "event: delete\ndata: 2\n\n",
        ]));

        let events = collect(EventStream::spawn(body, CancelToken::new())).await;

        assert_eq!(events.len(), 3);
        for event in &events[..2] {
            assert!(matches!(
                event,
                Event::Error(StreamError::Decode(DecodeError::UnknownEventType(label))) if label.is_empty()
            ));
        }
        assert!(matches!(events[2], Event::Delete(2)));
    }

    #[tokio::test]
    async fn test_read_error_is_final_event() {
        let body = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"event: delete\ndata: 1\n\n")),
            Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection dropped",
            )),
            Ok(Bytes::from_static(b"event: delete\ndata: 2\n\n")),
        ]);

        let mut stream = EventStream::spawn(body, CancelToken::new());

        assert!(matches!(stream.recv().await, Some(Event::Delete(1))));
        match stream.recv().await {
            Some(Event::Error(e)) => {
                assert!(e.is_terminal());
                assert!(matches!(e, StreamError::Io(_)));
            }
            other => panic!("expected read error, got {:?}", other),
        }
        assert!(stream.recv().await.is_none());
        assert_eq!(stream.close().await, StreamClosure::Error);
    }

    #[tokio::test]
    async fn test_cancel_closes_open_ended_stream() {
        let body = futures::stream::iter(chunks(&["event: delete\ndata: 1\n\n"]))
            .chain(futures::stream::pending());
        let cancel = CancelToken::new();
        let mut stream = EventStream::spawn(body, cancel.clone());

        assert!(matches!(stream.recv().await, Some(Event::Delete(1))));

        cancel.cancel();
        let next = tokio::time::timeout(Duration::from_secs(1), stream.recv())
            .await
            .expect("channel should close promptly after cancel");
        assert!(next.is_none());
        assert_eq!(stream.close().await, StreamClosure::Cancelled);
    }

    #[tokio::test]
    async fn test_no_events_observed_after_cancel() {
        // Everything is buffered before the caller reads anything.
        let body = futures::stream::iter(chunks(&[
            "event: delete\ndata: 1\n\nevent: delete\ndata: 2\n\n",
        ]))
        .chain(futures::stream::pending());
        let cancel = CancelToken::new();
        let mut stream = EventStream::spawn(body, cancel.clone());
        tokio::task::yield_now().await;

        cancel.cancel();

        assert!(stream.recv().await.is_none());
        assert!(futures::StreamExt::next(&mut stream).await.is_none());
    }

    #[tokio::test]
    async fn test_close_stops_session_without_cancelling_token() {
        let body = futures::stream::pending::<Chunk>();
        let cancel = CancelToken::new();
        let stream = EventStream::spawn(body, cancel.clone());

        let closure = tokio::time::timeout(Duration::from_secs(1), stream.close())
            .await
            .unwrap();

        assert_eq!(closure, StreamClosure::Cancelled);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_event_stream_as_futures_stream() {
        let body = futures::stream::iter(chunks(&[
            "event: delete\ndata: 1\n\n",
            "event: delete\ndata: 2\n\n",
        ]));

        let ids: Vec<i64> = EventStream::spawn(body, CancelToken::new())
            .filter_map(|event| async move {
                match event {
                    Event::Delete(id) => Some(id),
                    _ => None,
                }
            })
            .collect()
            .await;

        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_cancel_token_wakes_waiters() {
        let cancel = CancelToken::new();
        let waiter = {
            let cancel = cancel.clone();
            tokio::spawn(async move { cancel.cancelled().await })
        };

        cancel.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_recv_waits_until_cancelled() {
        let cancel = CancelToken::new();
        let mut stream = EventStream::spawn(futures::stream::pending::<Chunk>(), cancel.clone());

        let mut recv = tokio_test::task::spawn(stream.recv());
        tokio_test::assert_pending!(recv.poll());

        cancel.cancel();
        assert!(recv.is_woken());
        assert!(tokio_test::assert_ready!(recv.poll()).is_none());
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(StreamEndpoint::Public.path(), "/api/v1/streaming/public");
        assert_eq!(
            StreamEndpoint::PublicLocal.path(),
            "/api/v1/streaming/public/local"
        );
        assert_eq!(StreamEndpoint::User.path(), "/api/v1/streaming/user");
        assert_eq!(
            StreamEndpoint::Hashtag("#rust".into()).query(),
            vec![("tag", "rust".to_string())]
        );
        assert!(StreamEndpoint::Public.query().is_empty());
    }
}
