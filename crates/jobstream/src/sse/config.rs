//! Stream session configuration.

use std::time::Duration;

/// Configuration for a stream session.
///
/// Immutable once the session is created. Provides sensible defaults and
/// chainable setter methods.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Event stream endpoint URL.
    pub url: String,
    /// Last known event id, sent as `Last-Event-ID` when set.
    ///
    /// Upstreams that ignore it restart from the beginning on every
    /// reconnect; the session's delivery cursor covers that case.
    pub last_event_id: Option<String>,
    /// Base retry interval. Backoff starts at `retry / 32` and never exceeds
    /// `retry`.
    pub retry: Duration,
    /// Additional HTTP headers to include with every connection attempt.
    /// They override headers of the same name from the header provider.
    pub headers: http::HeaderMap,
    /// Whether 500/502/503/504 are escalated to the error handler instead of
    /// being retried silently.
    pub verbose_status_codes: bool,
    /// Connection timeout for the stock transport.
    pub connect_timeout: Duration,
    /// Random jitter factor (0.0–1.0) for backoff delays.
    pub reconnect_jitter: f64,
    /// Capacity of the channel used by the non-blocking variant.
    pub event_channel_capacity: usize,
    /// Upper bound on the whole session; reaching it ends the session cleanly.
    pub deadline: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            last_event_id: None,
            retry: Duration::from_secs(2),
            headers: http::HeaderMap::new(),
            verbose_status_codes: false,
            connect_timeout: Duration::from_secs(10),
            reconnect_jitter: 0.0,
            event_channel_capacity: 16,
            deadline: None,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with the given URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the last known event id.
    #[must_use]
    pub fn last_event_id(mut self, id: impl Into<String>) -> Self {
        self.last_event_id = Some(id.into());
        self
    }

    /// Set the base retry interval.
    #[must_use]
    pub fn retry(mut self, retry: Duration) -> Self {
        self.retry = retry;
        self
    }

    /// Set additional HTTP headers.
    #[must_use]
    pub fn headers(mut self, headers: http::HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Escalate transient 5xx statuses to the error handler.
    #[must_use]
    pub fn verbose_status_codes(mut self, verbose: bool) -> Self {
        self.verbose_status_codes = verbose;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the reconnection jitter factor.
    #[must_use]
    pub fn reconnect_jitter(mut self, jitter: f64) -> Self {
        self.reconnect_jitter = jitter;
        self
    }

    /// Set the event channel capacity.
    #[must_use]
    pub fn event_channel_capacity(mut self, capacity: usize) -> Self {
        self.event_channel_capacity = capacity;
        self
    }

    /// Bound the session's lifetime.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error message string if any field has an invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("URL cannot be empty".to_string());
        }
        if let Err(e) = url::Url::parse(&self.url) {
            return Err(format!("Invalid URL: {e}"));
        }
        if self.retry.is_zero() {
            return Err("Retry interval must be > 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.reconnect_jitter) {
            return Err("Jitter must be between 0.0 and 1.0".to_string());
        }
        if self.event_channel_capacity == 0 {
            return Err("Event channel capacity must be > 0".to_string());
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err("Deadline must be > 0".to_string());
        }
        Ok(())
    }
}
