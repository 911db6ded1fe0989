//! Error types used by the frame reader.

use core::{
    fmt::{Display, Formatter},
    str::Utf8Error,
};

/// Framing defects the reader refuses to paper over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedFrame {
    /// Input ended with a partial line still buffered.
    IncompleteLine {
        /// Number of bytes in the unterminated line.
        buffered: usize,
    },
    /// The stream started with a byte-order mark.
    ByteOrderMark,
    /// A line contained a carriage return that was not part of its terminator.
    CarriageReturn,
}

impl Display for MalformedFrame {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::IncompleteLine { buffered } => write!(
                f,
                "incomplete event at the end of the stream ({buffered} bytes buffered)"
            ),
            Self::ByteOrderMark => write!(f, "byte-order mark is not supported"),
            Self::CarriageReturn => write!(f, "carriage-return line separators are not supported"),
        }
    }
}

/// Errors produced by [`EventStream`](super::event_stream::EventStream).
#[derive(Debug, PartialEq)]
pub enum EventStreamError<E> {
    /// Something went wrong with the underlying stream.
    Transport(E),
    /// A payload contained invalid UTF-8.
    Utf8Error(Utf8Error),
    /// The framing itself is broken.
    Malformed(MalformedFrame),
}

impl<E> From<Utf8Error> for EventStreamError<E> {
    fn from(value: Utf8Error) -> Self {
        Self::Utf8Error(value)
    }
}

impl<E> From<MalformedFrame> for EventStreamError<E> {
    fn from(value: MalformedFrame) -> Self {
        Self::Malformed(value)
    }
}

impl<E> Display for EventStreamError<E>
where
    E: Display,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Transport(e) => e.fmt(f),
            Self::Utf8Error(e) => e.fmt(f),
            Self::Malformed(m) => m.fmt(f),
        }
    }
}

impl<E> core::error::Error for EventStreamError<E> where E: core::error::Error {}
