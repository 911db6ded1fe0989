//! Server-sent event sessions for long-running job progress streams.
//!
//! This module provides:
//!
//! - **Frame reading**: the [`parse`] module turns a byte stream into
//!   `data:` payloads and recognises the `[DONE]` sentinel.
//! - **Auto-reconnection**: transient failures are retried with exponential
//!   backoff that resets after every clean disconnect.
//! - **Exactly-once delivery across reconnects**: the upstream replays the
//!   whole stream on every connection, and the session skips what it already
//!   delivered.
//! - **Two consumption styles**: inline callbacks via
//!   [`StreamSession::start`], or a background task feeding a
//!   [`SessionStream`] via [`StreamSession::stream`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use jobstream::{
//!     ReqwestTransport, SessionConfig, StreamSession,
//!     auth::BearerAuth,
//!     sse::handlers::{ErrorPolicy, handler_fn},
//! };
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SessionConfig::new("https://api.openai.com/v1/fine-tunes/ft-1/events?stream=true");
//! let transport = ReqwestTransport::new(config.connect_timeout)?;
//! let mut session = StreamSession::new(config, transport, BearerAuth::new("sk-..."))?;
//!
//! let handler = handler_fn(
//!     |event: jobstream::RawEvent| {
//!         println!("{}", event.data());
//!         Ok(())
//!     },
//!     ErrorPolicy::StopOnError,
//! );
//! session.start(CancellationToken::new(), handler).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Index
//!
//! | Module | Description |
//! |--------|-------------|
//! | `config` | [`SessionConfig`] builder |
//! | [`session`] | [`StreamSession`], [`SessionStream`] |
//! | `handler` | [`StreamHandler`] trait |
//! | `types` | [`SessionState`], [`StreamMessage`] |
//! | [`handlers`] | Ready-to-use handlers |
//! | [`parse`] | Frame reader |

mod config;
mod handler;
pub mod handlers;
pub mod parse;
pub mod session;
mod types;

pub use config::SessionConfig;
pub use handler::StreamHandler;
pub use parse::{EventStream, EventStreamError, Frame, MalformedFrame, RawEvent};
pub use session::{SessionStream, StreamSession};
pub use types::{SessionState, StreamMessage};
