//! Channel-backed handler for the non-blocking variant.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    error::{BoxError, StreamError},
    sse::{handler::StreamHandler, parse::RawEvent, types::StreamMessage},
};

/// Forwards events and escalated errors into an mpsc channel.
///
/// Errors are absorbed after being forwarded, so the session keeps retrying
/// until it finishes, is cancelled, or the receiver is dropped.
#[derive(Debug)]
pub struct ChannelHandler {
    tx: mpsc::Sender<StreamMessage>,
    cancel: CancellationToken,
}

impl ChannelHandler {
    /// Create a handler sending into `tx`; sends give up once `cancel` fires.
    pub fn new(tx: mpsc::Sender<StreamMessage>, cancel: CancellationToken) -> Self {
        Self { tx, cancel }
    }
}

#[async_trait]
impl StreamHandler for ChannelHandler {
    async fn on_event(&mut self, event: RawEvent) -> Result<(), BoxError> {
        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => Ok(()),
            sent = self.tx.send(StreamMessage::Event(event)) => {
                sent.map_err(|_| -> BoxError { "stream receiver dropped".into() })
            }
        }
    }

    async fn on_error(&mut self, error: StreamError) -> Result<(), StreamError> {
        if self.tx.is_closed() {
            debug!(error = %error, "Stream receiver dropped, stopping");
            return Err(error);
        }

        tokio::select! {
            biased;

            _ = self.cancel.cancelled() => Err(StreamError::Cancelled),
            sent = self.tx.send(StreamMessage::Error(error)) => {
                match sent {
                    Ok(()) => Ok(()),
                    Err(mpsc::error::SendError(msg)) => match msg {
                        StreamMessage::Error(error) => Err(error),
                        StreamMessage::Event(_) => Err(StreamError::Cancelled),
                    },
                }
            }
        }
    }
}
