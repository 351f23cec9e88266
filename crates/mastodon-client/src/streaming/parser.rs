//! Event-stream frame reader
//!
//! Splits the response body into lines and groups them into frames. A frame
//! is closed by a blank line; `event:` sets its label and `data:` lines are
//! appended to its payload. Anything else is a comment or heartbeat.

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use tracing::{debug, trace};

use super::types::Frame;

/// Frame reader state
#[derive(Debug, Default)]
pub struct FrameReader {
    /// Bytes of the line currently being received
    buffer: Vec<u8>,
    /// Frame being accumulated
    pending: PendingFrame,
}

/// Open frame; `seen` is set once an `event:` or `data:` line arrived
#[derive(Debug, Default)]
struct PendingFrame {
    frame: Frame,
    seen: bool,
}

impl PendingFrame {
    fn process_line(&mut self, line: &[u8]) -> Option<Frame> {
        if line.iter().all(u8::is_ascii_whitespace) {
            if !self.seen {
                return None;
            }
            return Some(std::mem::take(self).frame);
        }

        if let Some(value) = field_value(line, b"event:") {
            self.frame.event = String::from_utf8_lossy(value).trim().to_string();
            self.seen = true;
        } else if let Some(value) = field_value(line, b"data:") {
            self.frame.data.extend_from_slice(value);
            self.seen = true;
        } else {
            trace!("Ignoring stream line: {}", String::from_utf8_lossy(line));
        }

        None
    }
}

impl FrameReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the reader and return every frame they complete
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        self.buffer.extend_from_slice(bytes);

        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            let mut line = &self.buffer[start..end];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            if let Some(frame) = self.pending.process_line(line) {
                frames.push(frame);
            }
            start = end + 1;
        }
        self.buffer.drain(..start);

        frames
    }

    /// Consume the reader at end of stream
    ///
    /// Returns the frame that was still open, if any. It never reached its
    /// terminating blank line and must not be decoded.
    pub fn finish(self) -> Option<Frame> {
        let mut pending = self.pending;
        // An unterminated trailing line still belongs to the open frame.
        if !self.buffer.is_empty() {
            if let Some(frame) = pending.process_line(&self.buffer) {
                return Some(frame);
            }
        }
        pending.seen.then_some(pending.frame)
    }
}

/// Value of `field: value`, without the single optional space after the colon
fn field_value<'a>(line: &'a [u8], field: &[u8]) -> Option<&'a [u8]> {
    let value = line.strip_prefix(field)?;
    Some(value.strip_prefix(b" ").unwrap_or(value))
}

/// Lazily read frames from a response body
///
/// The returned stream ends when the body ends, discarding any unterminated
/// frame, or right after yielding the first read error.
pub fn frames<S, E>(body: S) -> impl Stream<Item = Result<Frame, E>>
where
    S: Stream<Item = Result<Bytes, E>>,
{
    async_stream::stream! {
        let mut reader = FrameReader::new();
        let mut body = std::pin::pin!(body);

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    for frame in reader.feed(&bytes) {
                        yield Ok(frame);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        if let Some(partial) = reader.finish() {
            debug!(
                event = %partial.event,
                bytes = partial.data.len(),
                "Discarding unterminated frame at end of stream"
            );
        }
    }
}
