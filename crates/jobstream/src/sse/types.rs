//! Core type definitions for stream sessions.

use std::{fmt, time::Duration};

use super::parse::RawEvent;
use crate::error::StreamError;

/// Stream session state machine states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Created, not started.
    Idle,
    /// Opening a connection.
    Connecting,
    /// Reading frames from an open connection.
    Streaming,
    /// Waiting before the next connection attempt.
    Backoff {
        /// How long this wait lasts.
        delay: Duration,
    },
    /// Finished without error (sentinel, cancellation or deadline).
    Done,
    /// Stopped by an error the error handler refused to absorb.
    Failed,
}

impl SessionState {
    /// Returns `true` if the session is actively streaming.
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming)
    }

    /// Returns `true` while a connection attempt is in flight.
    pub fn is_connecting(&self) -> bool {
        matches!(self, Self::Connecting)
    }

    /// Returns `true` if the session is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Streaming => write!(f, "Streaming"),
            Self::Backoff { delay } => write!(f, "Backoff({delay:?})"),
            Self::Done => write!(f, "Done"),
            Self::Failed => write!(f, "Failed"),
        }
    }
}

/// Item of the non-blocking variant: one event or one escalated error.
#[derive(Debug)]
pub enum StreamMessage {
    /// A newly delivered event.
    Event(RawEvent),
    /// An escalated error. The session keeps retrying after it.
    Error(StreamError),
}

impl StreamMessage {
    /// Returns true if this message carries an event.
    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event(_))
    }

    /// The carried event, if any.
    pub fn event(&self) -> Option<&RawEvent> {
        match self {
            Self::Event(event) => Some(event),
            Self::Error(_) => None,
        }
    }

    /// The carried error, if any.
    pub fn error(&self) -> Option<&StreamError> {
        match self {
            Self::Event(_) => None,
            Self::Error(error) => Some(error),
        }
    }

    /// Convert into a `Result`.
    pub fn into_result(self) -> Result<RawEvent, StreamError> {
        match self {
            Self::Event(event) => Ok(event),
            Self::Error(error) => Err(error),
        }
    }
}
