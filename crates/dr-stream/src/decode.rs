//! Byte stream → frame stream adapter.

use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;

use crate::{Frame, Framing, FramingKind, StreamError};

/// Type-erased frame sequence handed from a transport to the session
/// controller.
pub type BoxFrameStream = Pin<Box<dyn Stream<Item = Result<Frame, StreamError>> + Send>>;

/// Decode `body` with the given framing.
pub fn decode<S>(body: S, kind: FramingKind) -> FrameStream<S> {
    FrameStream::new(body, kind.framing())
}

/// Lazy, finite, ordered sequence of frames decoded from a byte stream.
///
/// - Frames are yielded strictly in arrival order.
/// - Frames whose payload is not valid JSON are dropped with a warning and
///   decoding continues.
/// - A read error is yielded once and ends the sequence.
/// - At end of input, unterminated buffered data is discarded.
///
/// The stream is not restartable: each transport open builds a new one.
pub struct FrameStream<S> {
    inner: S,
    framing: Box<dyn Framing>,
    pending: VecDeque<Frame>,
    finished: bool,
}

impl<S> FrameStream<S> {
    pub fn new(inner: S, framing: Box<dyn Framing>) -> Self {
        Self {
            inner,
            framing,
            pending: VecDeque::new(),
            finished: false,
        }
    }

    fn enqueue_chunk(&mut self, chunk: &[u8]) {
        for raw in self.framing.feed(chunk) {
            let event_type = raw.event_type.clone();
            match Frame::from_raw(raw) {
                Ok(frame) => self.pending.push_back(frame),
                Err(error) => {
                    tracing::warn!(%event_type, %error, "dropping frame with malformed payload");
                }
            }
        }
    }
}

impl<S, B, E> Stream for FrameStream<S>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    B: AsRef<[u8]>,
    E: Display,
{
    type Item = Result<Frame, StreamError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(frame) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(frame)));
            }
            if this.finished {
                return Poll::Ready(None);
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => this.enqueue_chunk(chunk.as_ref()),
                Poll::Ready(Some(Err(error))) => {
                    this.finished = true;
                    this.framing.finish();
                    return Poll::Ready(Some(Err(StreamError::Read(error.to_string()))));
                }
                Poll::Ready(None) => {
                    this.finished = true;
                    let discarded = this.framing.finish();
                    if discarded > 0 {
                        tracing::debug!(bytes = discarded, "discarding unterminated trailing frame data");
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
