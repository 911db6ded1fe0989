//! Frame reader for the `data:`-only subset of server-sent events.
//!
//! The reader turns a stream of byte chunks into [`Frame`]s. Only `data:`
//! lines carry payload; blank lines and every other field are skipped. The
//! `[DONE]` sentinel ends the logical stream, and input that stops in the
//! middle of a line is reported as [`MalformedFrame`].

pub(crate) mod constants;
pub(crate) mod errors;
pub mod event;
pub mod event_stream;
pub(crate) mod parser;

pub use errors::{EventStreamError, MalformedFrame};
pub use event::{Frame, RawEvent};
pub use event_stream::EventStream;
