//! Callback contract between a stream session and its consumer.
//!
//! Provides the [`StreamHandler`] trait. Callbacks run inline on the task that
//! drives the session, so the consumer decides its own concurrency model.

use async_trait::async_trait;

use super::parse::RawEvent;
use crate::error::{BoxError, StreamError};

/// Consumer side of a stream session.
///
/// Implementors receive each newly delivered event and decide what happens
/// after an escalated error.
#[async_trait]
pub trait StreamHandler: Send {
    /// Called once per event, in wire order, never twice for the same event.
    ///
    /// Returning an error escalates it as [`StreamError::Consumer`]. The event
    /// still counts as delivered.
    async fn on_event(&mut self, event: RawEvent) -> Result<(), BoxError>;

    /// Called for every escalated error.
    ///
    /// `Ok(())` absorbs the error: the session backs off and reconnects.
    /// `Err(e)` stops the session and `e` is returned to its caller.
    ///
    /// Default implementation stops on every error.
    async fn on_error(&mut self, error: StreamError) -> Result<(), StreamError> {
        Err(error)
    }

    /// Called when a connection starts streaming.
    ///
    /// Default implementation does nothing.
    fn on_connect(&mut self) {}

    /// Called when a streaming connection is released.
    ///
    /// Default implementation does nothing.
    fn on_disconnect(&mut self) {}
}
