//! # jobstream
//!
//! Resilient server-sent event subscriptions for long-running API jobs.
//!
//! A job (for example a model fine-tune) publishes progress as a stream of
//! `data:` frames that ends with `data: [DONE]`. Connections to such streams
//! drop regularly, and the upstream replays the whole stream on every
//! reconnect. This crate keeps one logical subscription alive across those
//! drops and hands each event to the consumer exactly once, in order.
//!
//! ## Features
//!
//! - **Frame reader**: zero-copy `data:`-line extraction with `[DONE]`
//!   detection and truncated-frame detection
//! - **Reconnection**: exponential backoff from `retry / 32` up to `retry`,
//!   reset after every clean disconnect
//! - **Error classes**: transient failures are retried silently, everything
//!   else goes through a caller-supplied error handler
//! - **Pluggable seams**: [`EventTransport`] for HTTP, [`HeaderProvider`]
//!   for credentials
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures_util::StreamExt;
//! use jobstream::{EventClient, StreamMessage};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = EventClient::openai("sk-...")?;
//!     let session = client.fine_tune_events("ft-abc123")?;
//!
//!     let mut stream = session.stream(CancellationToken::new());
//!     while let Some(message) = stream.next().await {
//!         match message {
//!             StreamMessage::Event(event) => println!("{}", event.data()),
//!             StreamMessage::Error(err) => eprintln!("stream error: {err}"),
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod reconnect;
pub mod sse;
pub mod transport;

// Re-export commonly used types
pub use auth::{BearerAuth, HeaderProvider, NoAuth, StaticHeaders};
pub use client::EventClient;
pub use error::{BoxError, StreamError, StreamResult};
pub use reconnect::Backoff;
pub use sse::{
    Frame, RawEvent, SessionConfig, SessionState, SessionStream, StreamHandler, StreamMessage,
    StreamSession,
};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::{ByteStream, EventTransport, StreamRequest, StreamResponse};
