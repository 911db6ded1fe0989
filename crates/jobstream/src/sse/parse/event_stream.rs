//! [`Stream`] that converts a stream of
//! [`Bytes`](bytes::Bytes) chunks into [`Frame`]s.

use core::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use bytes::BytesMut;
use futures_core::Stream;

use super::{
    errors::{EventStreamError, MalformedFrame},
    event::{Frame, RawEvent},
    parser::{ValidatedLine, classify_line, take_line},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventStreamState {
    NotStarted,
    Started,
    Terminated,
}

impl EventStreamState {
    fn is_terminated(self) -> bool {
        matches!(self, Self::Terminated)
    }

    fn is_not_started(self) -> bool {
        matches!(self, Self::NotStarted)
    }
}

pin_project_lite::pin_project! {
    /// A [`Stream`] that reads `\n`-terminated lines from a stream of byte
    /// chunks and yields one [`Frame`] per payload line.
    ///
    /// The stream is finite and cannot be restarted. It ends (`None`) in three
    /// situations:
    ///
    /// - right after yielding [`Frame::Done`]; nothing past the sentinel is read,
    /// - when the underlying stream ends with no partial line buffered, which
    ///   the session treats as a clean disconnect,
    /// - after yielding an error.
    ///
    /// Input that ends with a partial line yields
    /// [`MalformedFrame::IncompleteLine`] instead of a truncated event.
    #[project = EventStreamProjection]
    #[derive(Debug)]
    pub struct EventStream<S> {
        #[pin]
        stream: S,
        buffer: BytesMut,
        state: EventStreamState,
    }
}

impl<S> EventStream<S> {
    /// Create a new [`EventStream`] from an underlying byte stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: BytesMut::new(),
            state: EventStreamState::NotStarted,
        }
    }

    /// Returns `true` once the stream has yielded its last item.
    pub fn is_terminated(&self) -> bool {
        self.state.is_terminated()
    }

    /// Take the current buffer (useful for checking leftovers).
    pub fn take_buffer(self) -> BytesMut {
        self.buffer
    }
}

/// Pulls complete lines out of the buffer until one produces an item.
fn next_buffered_frame<E>(
    buffer: &mut BytesMut,
    state: &mut EventStreamState,
) -> Option<Result<Frame, EventStreamError<E>>> {
    while let Some(line) = take_line(buffer) {
        let first = state.is_not_started();
        *state = EventStreamState::Started;

        match classify_line(line, first) {
            Ok(ValidatedLine::Blank | ValidatedLine::Ignored) => continue,
            Ok(ValidatedLine::Data(data)) => return Some(Ok(Frame::Event(RawEvent { data }))),
            Ok(ValidatedLine::Done) => {
                *state = EventStreamState::Terminated;
                return Some(Ok(Frame::Done));
            }
            Err(e) => {
                *state = EventStreamState::Terminated;
                return Some(Err(e));
            }
        }
    }
    None
}

impl<S, E, B> Stream for EventStream<S>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    type Item = Result<Frame, EventStreamError<E>>;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<<Self as Stream>::Item>> {
        let mut this = self.project();

        loop {
            if this.state.is_terminated() {
                return Poll::Ready(None);
            }

            if let Some(item) = next_buffered_frame(this.buffer, this.state) {
                return Poll::Ready(Some(item));
            }

            match ready!(this.stream.as_mut().poll_next(cx)) {
                Some(Ok(chunk)) => this.buffer.extend_from_slice(chunk.as_ref()),
                Some(Err(e)) => {
                    *this.state = EventStreamState::Terminated;
                    return Poll::Ready(Some(Err(EventStreamError::Transport(e))));
                }
                None => {
                    *this.state = EventStreamState::Terminated;
                    if this.buffer.is_empty() {
                        return Poll::Ready(None);
                    }
                    let buffered = this.buffer.len();
                    return Poll::Ready(Some(Err(EventStreamError::Malformed(
                        MalformedFrame::IncompleteLine { buffered },
                    ))));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures_util::StreamExt;

    use super::*;

    async fn read_all(chunks: Vec<&'static str>) -> Vec<Result<Frame, EventStreamError<()>>> {
        EventStream::new(futures_util::stream::iter(
            chunks
                .into_iter()
                .map(|chunk| Ok::<_, ()>(Bytes::from_static(chunk.as_bytes()))),
        ))
        .collect::<Vec<_>>()
        .await
    }

    fn event(data: &'static str) -> Result<Frame, EventStreamError<()>> {
        Ok(Frame::Event(RawEvent::from(data)))
    }

    #[tokio::test]
    async fn yields_payloads_in_wire_order_then_done() {
        assert_eq!(
            read_all(vec!["data: {\"a\":1}\n\ndata: {\"b\":2}\n\ndata: [DONE]\n\n"]).await,
            vec![event("{\"a\":1}"), event("{\"b\":2}"), Ok(Frame::Done)]
        );
    }

    #[tokio::test]
    async fn lines_split_across_chunks() {
        assert_eq!(
            read_all(vec!["da", "ta: Hel", "", "lo, world!\n", "data: [DO", "NE]\n"]).await,
            vec![event("Hello, world!"), Ok(Frame::Done)]
        );
    }

    #[tokio::test]
    async fn nothing_after_sentinel_is_read() {
        assert_eq!(
            read_all(vec!["data: one\ndata: [DONE]\ndata: two\npartial"]).await,
            vec![event("one"), Ok(Frame::Done)]
        );
    }

    #[tokio::test]
    async fn ignores_other_fields_and_comments() {
        assert_eq!(
            read_all(vec![
                ": heartbeat\nevent: progress\nid: 42\nretry: 1000\ndata: payload\n\n"
            ])
            .await,
            vec![event("payload")]
        );
    }

    #[tokio::test]
    async fn multiple_data_lines_are_separate_events() {
        assert_eq!(
            read_all(vec!["data: first\ndata: second\n\n"]).await,
            vec![event("first"), event("second")]
        );
    }

    #[tokio::test]
    async fn clean_end_between_frames() {
        assert_eq!(read_all(vec!["data: only\n"]).await, vec![event("only")]);
        assert!(read_all(vec![]).await.is_empty());
    }

    #[tokio::test]
    async fn partial_final_line_is_malformed() {
        assert_eq!(
            read_all(vec!["data: complete\n", "data: {\"trunc"]).await,
            vec![
                event("complete"),
                Err(EventStreamError::Malformed(MalformedFrame::IncompleteLine {
                    buffered: 13
                }))
            ]
        );

        // Even whitespace counts as a partial line.
        assert_eq!(
            read_all(vec!["data: complete\n "]).await,
            vec![
                event("complete"),
                Err(EventStreamError::Malformed(MalformedFrame::IncompleteLine {
                    buffered: 1
                }))
            ]
        );
    }

    #[tokio::test]
    async fn byte_order_mark_is_rejected() {
        assert_eq!(
            read_all(vec!["\u{FEFF}data: x\n"]).await,
            vec![Err(EventStreamError::Malformed(MalformedFrame::ByteOrderMark))]
        );
    }

    #[tokio::test]
    async fn bare_carriage_return_is_rejected() {
        assert_eq!(
            read_all(vec!["data: a\rdata: b\n"]).await,
            vec![Err(EventStreamError::Malformed(MalformedFrame::CarriageReturn))]
        );
    }

    #[tokio::test]
    async fn transport_error_ends_stream() {
        let frames = EventStream::new(futures_util::stream::iter(vec![
            Ok(Bytes::from_static(b"data: a\n")),
            Err("connection reset"),
            Ok(Bytes::from_static(b"data: b\n")),
        ]))
        .collect::<Vec<_>>()
        .await;

        assert_eq!(
            frames,
            vec![
                Ok(Frame::Event(RawEvent::from("a"))),
                Err(EventStreamError::Transport("connection reset")),
            ]
        );
    }

    #[tokio::test]
    async fn terminated_after_done() {
        let mut stream = EventStream::new(futures_util::stream::iter(vec![Ok::<_, ()>(
            Bytes::from_static(b"data: [DONE]\n"),
        )]));
        assert_eq!(stream.next().await, Some(Ok(Frame::Done)));
        assert!(stream.is_terminated());
        assert_eq!(stream.next().await, None);
    }
}
