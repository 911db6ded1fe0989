//! Ready-to-use [`StreamHandler`](super::StreamHandler) implementations.
//!
//! - [`FnHandler`]: wraps a pair of closures, see [`handler_fn`]
//! - [`ErrorPolicy`]: the two common error-handling decisions
//! - [`ChannelHandler`]: forwards everything into a channel (non-blocking
//!   variant)

mod callback;
mod channel;

pub use callback::{ErrorHandler, ErrorPolicy, FnHandler, handler_fn};
pub use channel::ChannelHandler;
