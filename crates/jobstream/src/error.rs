//! Error taxonomy for stream sessions.
//!
//! Every failure a session can observe maps onto one [`StreamError`] variant.
//! The variants fall into two classes:
//!
//! - **silent**: expected for long-lived streams and retried without
//!   involving the caller ([`TransientConnect`](StreamError::TransientConnect),
//!   [`TransientServer`](StreamError::TransientServer),
//!   [`CleanDisconnect`](StreamError::CleanDisconnect),
//!   [`Cancelled`](StreamError::Cancelled));
//! - **escalated**: handed to the caller's error handler, whose answer decides
//!   whether the session keeps retrying or stops
//!   ([`MalformedFrame`](StreamError::MalformedFrame),
//!   [`ProtocolStatus`](StreamError::ProtocolStatus),
//!   [`Consumer`](StreamError::Consumer),
//!   [`Transport`](StreamError::Transport)).

use thiserror::Error;

use crate::sse::parse::EventStreamError;

/// Boxed error used at the collaborator seams (transport, event handlers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main result type used throughout the crate.
pub type StreamResult<T> = Result<T, StreamError>;

/// Errors produced while running a stream session.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The connection could not be established.
    #[error("cannot connect to the stream: {message}")]
    TransientConnect { message: String },

    /// The server answered with one of the transient 5xx statuses.
    #[error("transient server status {}", status.as_u16())]
    TransientServer { status: http::StatusCode },

    /// The body ended exactly between two frames.
    #[error("stream disconnected between frames")]
    CleanDisconnect,

    /// The body ended mid-frame or contained framing the reader rejects.
    #[error("malformed frame: {reason}")]
    MalformedFrame { reason: String },

    /// The server answered with a status the session does not retry silently.
    #[error("bad response status code {}", status.as_u16())]
    ProtocolStatus { status: http::StatusCode },

    /// The event handler rejected an event.
    #[error("event handler error: {0}")]
    Consumer(#[source] BoxError),

    /// Reading the open body failed.
    #[error("stream read error: {message}")]
    Transport { message: String },

    /// The caller stopped the session.
    #[error("stream cancelled")]
    Cancelled,

    /// The session or one of its collaborators is misconfigured.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl StreamError {
    /// Create a connection failure.
    pub fn transient_connect(message: impl Into<String>) -> Self {
        Self::TransientConnect {
            message: message.into(),
        }
    }

    /// Create a malformed frame error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            reason: reason.into(),
        }
    }

    /// Create a protocol status error.
    pub fn protocol_status(status: http::StatusCode) -> Self {
        Self::ProtocolStatus { status }
    }

    /// Create a body read error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Wrap an error returned by an event handler.
    pub fn consumer(error: impl Into<BoxError>) -> Self {
        Self::Consumer(error.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns `true` for failures that are retried without telling the caller.
    pub fn is_silent(&self) -> bool {
        matches!(
            self,
            Self::TransientConnect { .. }
                | Self::TransientServer { .. }
                | Self::CleanDisconnect
                | Self::Cancelled
        )
    }

    /// Returns `true` for failures that go through the caller's error handler.
    pub fn is_escalated(&self) -> bool {
        matches!(
            self,
            Self::MalformedFrame { .. }
                | Self::ProtocolStatus { .. }
                | Self::Consumer(_)
                | Self::Transport { .. }
        )
    }

    /// Returns `true` if this error records a caller-initiated stop.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::TransientServer { status } | Self::ProtocolStatus { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<EventStreamError<BoxError>> for StreamError {
    fn from(e: EventStreamError<BoxError>) -> Self {
        match e {
            EventStreamError::Transport(e) => Self::transport(e.to_string()),
            EventStreamError::Utf8Error(e) => Self::malformed(format!("invalid UTF-8: {e}")),
            EventStreamError::Malformed(m) => Self::malformed(m.to_string()),
        }
    }
}

impl From<url::ParseError> for StreamError {
    fn from(e: url::ParseError) -> Self {
        Self::config(format!("invalid URL: {e}"))
    }
}

impl From<http::header::InvalidHeaderValue> for StreamError {
    fn from(e: http::header::InvalidHeaderValue) -> Self {
        Self::config(format!("invalid header value: {e}"))
    }
}
