//! Frames produced by the reader.

use std::fmt;

use bytes_utils::Str;
use serde::de::DeserializeOwned;

/// A single payload extracted from one `data:` line.
///
/// The payload is opaque: it has the field prefix and surrounding whitespace
/// stripped and nothing else. Decoding it is up to the consumer, see
/// [`json()`](RawEvent::json).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RawEvent {
    /// The trimmed payload.
    pub data: Str,
}

impl RawEvent {
    /// Create an event from a payload.
    pub fn new(data: impl Into<Str>) -> Self {
        Self { data: data.into() }
    }

    /// The payload as a string slice.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Decode the payload as JSON.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the payload is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.data)
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.data)
    }
}

impl From<&'static str> for RawEvent {
    fn from(data: &'static str) -> Self {
        Self::new(Str::from_static(data))
    }
}

/// One item read from an open stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A payload to hand to the consumer.
    Event(RawEvent),
    /// The `[DONE]` sentinel: the logical stream is complete.
    Done,
}

impl Frame {
    /// Returns `true` for the end-of-stream sentinel.
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// The carried event, if any.
    pub fn into_event(self) -> Option<RawEvent> {
        match self {
            Self::Event(event) => Some(event),
            Self::Done => None,
        }
    }
}
