//! Stream session driver implementation.
//!
//! Provides [`StreamSession`], which runs the connect / stream / backoff loop
//! for one logical subscription, and [`SessionStream`], the receiving end of
//! the non-blocking variant.
//!
//! # Delivery cursor
//!
//! The upstream has no resumption token: every reconnect replays the stream
//! from its first frame. The session therefore counts the events it has
//! handed to the consumer (the delivery cursor) and, on each connection,
//! skips as many leading frames as the cursor says were already delivered.
//! This is only correct while the upstream resends the *full* stream on every
//! reconnect. A replay that is shorter than the cursor, or that starts with
//! different frames, makes the session suppress events it never delivered;
//! the session logs a warning when it sees a connection end before catching
//! up with the cursor.

use std::{
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};

use futures_util::{Stream, StreamExt};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::{
    config::SessionConfig,
    handler::StreamHandler,
    handlers::ChannelHandler,
    parse::{EventStream, Frame},
    types::{SessionState, StreamMessage},
};
use crate::{
    auth::{HeaderProvider, NoAuth, merge_headers},
    error::{StreamError, StreamResult},
    reconnect::Backoff,
    transport::{ByteStream, EventTransport, StreamRequest},
};

/// Statuses retried without telling the caller (unless verbose).
const TRANSIENT_STATUSES: [StatusCode; 4] = [
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

// ---------------------------------------------------------------------------
// Public API: StreamSession
// ---------------------------------------------------------------------------

/// One logical subscription to an event stream endpoint.
///
/// The session owns its delivery cursor and backoff state; neither is ever
/// shared with another session. Create a new session for a new subscription.
pub struct StreamSession<T, P = NoAuth> {
    config: Arc<SessionConfig>,
    transport: T,
    provider: P,
    delivered: u64,
    backoff: Backoff,
    state_tx: watch::Sender<SessionState>,
}

impl<T: EventTransport> StreamSession<T, NoAuth> {
    /// Create a session that sends no provider headers.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn without_auth(config: SessionConfig, transport: T) -> StreamResult<Self> {
        Self::new(config, transport, NoAuth)
    }
}

impl<T: EventTransport, P: HeaderProvider> StreamSession<T, P> {
    /// Create a session. Nothing is connected until [`start()`](Self::start)
    /// or [`stream()`](Self::stream).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn new(config: SessionConfig, transport: T, provider: P) -> StreamResult<Self> {
        config.validate().map_err(StreamError::config)?;

        let backoff = Backoff::new(config.retry).with_jitter(config.reconnect_jitter);
        let (state_tx, _) = watch::channel(SessionState::Idle);

        Ok(Self {
            config: Arc::new(config),
            transport,
            provider,
            delivered: 0,
            backoff,
            state_tx,
        })
    }

    /// The session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Number of events handed to the consumer so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Current backoff state.
    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Current state machine state.
    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// Observe state transitions from another task.
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Run the session until it is done or fails.
    ///
    /// Events and escalated errors are handed to `handler` inline. Returns
    /// `Ok(())` when the `[DONE]` sentinel arrives, when `cancel` fires, or
    /// when the configured deadline passes. Returns the error `handler`
    /// refused to absorb otherwise.
    ///
    /// # Errors
    ///
    /// Returns the error the handler's `on_error` returned, or a
    /// configuration error if the header provider fails.
    pub async fn start<H: StreamHandler>(
        &mut self,
        cancel: CancellationToken,
        mut handler: H,
    ) -> StreamResult<()> {
        let result = match self.config.deadline {
            Some(deadline) => {
                let run = self.run(&cancel, &mut handler);
                match tokio::time::timeout(deadline, run).await {
                    Ok(result) => result,
                    Err(_) => {
                        info!(
                            url = %self.config.url,
                            ?deadline,
                            "Stream session deadline reached"
                        );
                        Ok(())
                    }
                }
            }
            None => self.run(&cancel, &mut handler).await,
        };

        match &result {
            Ok(()) => self.set_state(SessionState::Done),
            Err(err) => {
                error!(url = %self.config.url, error = %err, "Stream session failed");
                self.set_state(SessionState::Failed);
            }
        }
        result
    }

    /// Run the session on a background task and receive its output through
    /// a channel.
    ///
    /// Escalated errors are delivered as [`StreamMessage::Error`] and the
    /// session keeps retrying after each one. An error that stops the
    /// session is delivered as a final [`StreamMessage::Error`] before the
    /// stream ends. The stream also ends when the session is done, when
    /// `cancel` fires, or when the returned [`SessionStream`] is dropped.
    pub fn stream(self, cancel: CancellationToken) -> SessionStream
    where
        T: 'static,
        P: 'static,
    {
        let mut session = self;
        let (tx, rx) = mpsc::channel(session.config.event_channel_capacity);
        let handler = ChannelHandler::new(tx.clone(), cancel.clone());

        tokio::spawn(async move {
            if let Err(err) = session.start(cancel, handler).await {
                debug!(error = %err, "Background stream session ended with error");
                // Fails only when the receiver is gone.
                let _ = tx.send(StreamMessage::Error(err)).await;
            }
        });

        SessionStream { rx }
    }

    // -----------------------------------------------------------------------
    // Internal: state machine
    // -----------------------------------------------------------------------

    fn set_state(&self, state: SessionState) {
        trace!(state = %state, "Stream session state");
        self.state_tx.send_replace(state);
    }

    async fn run<H: StreamHandler>(
        &mut self,
        cancel: &CancellationToken,
        handler: &mut H,
    ) -> StreamResult<()> {
        loop {
            self.set_state(SessionState::Connecting);

            let err = match self.connect(cancel, handler).await {
                Ok(()) => {
                    info!(url = %self.config.url, delivered = self.delivered, "Stream completed");
                    self.backoff.reset();
                    return Ok(());
                }
                Err(err) => err,
            };

            match err {
                StreamError::Cancelled => {
                    info!(url = %self.config.url, "Stream session cancelled");
                    return Ok(());
                }
                StreamError::CleanDisconnect => {
                    debug!(url = %self.config.url, "Stream disconnected, reconnecting");
                    self.backoff.reset();
                    continue;
                }
                StreamError::Config { .. } => return Err(err),
                err if err.is_escalated() && cancel.is_cancelled() => {
                    debug!(
                        url = %self.config.url,
                        error = %err,
                        "Stream cancelled, not escalating"
                    );
                    return Ok(());
                }
                err if err.is_escalated() => {
                    warn!(url = %self.config.url, error = %err, "Stream error");
                    match handler.on_error(err).await {
                        Ok(()) => {}
                        Err(StreamError::Cancelled) => return Ok(()),
                        Err(fatal) => {
                            if cancel.is_cancelled() {
                                return Ok(());
                            }
                            return Err(fatal);
                        }
                    }
                }
                err => {
                    debug!(url = %self.config.url, error = %err, "Stream unavailable, retrying");
                }
            }

            let delay = self.backoff.delay();
            self.set_state(SessionState::Backoff { delay });
            debug!(delay_ms = delay.as_millis() as u64, "Stream reconnecting after backoff");

            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    info!(url = %self.config.url, "Stream session cancelled during backoff");
                    return Ok(());
                }
                _ = tokio::time::sleep(delay) => {}
            }
            self.backoff.advance();
        }
    }

    /// Perform a single connection and stream frames until it ends.
    ///
    /// `Ok(())` means the sentinel was reached. Every other way the connection
    /// can end is reported as an error for `run` to classify.
    async fn connect<H: StreamHandler>(
        &mut self,
        cancel: &CancellationToken,
        handler: &mut H,
    ) -> StreamResult<()> {
        let request = self.build_request().await?;

        info!(url = %self.config.url, delivered = self.delivered, "Stream connecting");
        let open = tokio::time::timeout(self.config.connect_timeout, self.transport.open(request));
        let opened = tokio::select! {
            biased;

            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            opened = open => opened,
        };

        let response = match opened {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                debug!(url = %self.config.url, error = %err, "Stream connection failed");
                return Err(StreamError::transient_connect(err.to_string()));
            }
            Err(_) => {
                debug!(
                    url = %self.config.url,
                    timeout = ?self.config.connect_timeout,
                    "Stream connection timed out"
                );
                return Err(StreamError::transient_connect(format!(
                    "timed out after {:?}",
                    self.config.connect_timeout
                )));
            }
        };

        let status = response.status;
        if status != StatusCode::OK {
            if TRANSIENT_STATUSES.contains(&status) && !self.config.verbose_status_codes {
                return Err(StreamError::TransientServer { status });
            }
            return Err(StreamError::protocol_status(status));
        }

        info!(url = %self.config.url, "Stream connection established");
        self.set_state(SessionState::Streaming);
        handler.on_connect();

        let mut frames = EventStream::new(response.body);
        let result = self.pump(&mut frames, cancel, handler).await;

        // Release the connection before anything else happens.
        drop(frames);
        handler.on_disconnect();
        result
    }

    /// Read frames from one connection, delivering the ones past the cursor.
    async fn pump<H: StreamHandler>(
        &mut self,
        frames: &mut EventStream<ByteStream>,
        cancel: &CancellationToken,
        handler: &mut H,
    ) -> StreamResult<()> {
        let mut seen: u64 = 0;

        loop {
            let next = tokio::select! {
                biased;

                _ = cancel.cancelled() => return Err(StreamError::Cancelled),
                next = frames.next() => next,
            };

            match next {
                Some(Ok(Frame::Event(event))) => {
                    seen += 1;
                    if seen <= self.delivered {
                        trace!(position = seen, "Skipping already delivered event");
                        continue;
                    }

                    debug!(position = seen, "Stream event received");
                    self.delivered += 1;
                    if let Err(e) = handler.on_event(event).await {
                        return Err(StreamError::Consumer(e));
                    }
                }
                Some(Ok(Frame::Done)) => return Ok(()),
                Some(Err(e)) => return Err(e.into()),
                None => {
                    if seen < self.delivered {
                        warn!(
                            replayed = seen,
                            delivered = self.delivered,
                            "Stream ended before replaying every delivered event; \
                             upstream may not resend the full stream on reconnect"
                        );
                    }
                    return Err(StreamError::CleanDisconnect);
                }
            }
        }
    }

    /// Framing headers, then provider headers, then configured headers.
    async fn build_request(&self) -> StreamResult<StreamRequest> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/event-stream"));
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        if let Some(id) = self.config.last_event_id.as_deref().filter(|id| !id.is_empty()) {
            headers.insert(
                HeaderName::from_static("last-event-id"),
                HeaderValue::from_str(id)?,
            );
        }

        self.provider.apply(&mut headers).await?;
        merge_headers(&mut headers, &self.config.headers);

        Ok(StreamRequest {
            url: self.config.url.clone(),
            headers,
        })
    }
}

// ---------------------------------------------------------------------------
// SessionStream
// ---------------------------------------------------------------------------

/// Receiving end of [`StreamSession::stream`].
///
/// Implements [`Stream`] for use with `StreamExt` combinators. Dropping it
/// stops the background session at its next delivery.
pub struct SessionStream {
    rx: mpsc::Receiver<StreamMessage>,
}

impl SessionStream {
    /// Receive the next message, waiting until one is available.
    ///
    /// Returns `None` once the session has ended.
    pub async fn next_message(&mut self) -> Option<StreamMessage> {
        self.rx.recv().await
    }
}

impl Stream for SessionStream {
    type Item = StreamMessage;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        Pin::new(&mut this.rx).poll_recv(cx)
    }
}
