//! Subscription entry point of an API client.
//!
//! [`EventClient`] keeps what every subscription shares (base URL, transport,
//! credentials, retry interval) and hands out a fresh [`StreamSession`] per
//! subscription.

use std::time::Duration;

use http::HeaderMap;
use url::Url;

use crate::{
    auth::HeaderProvider,
    error::StreamResult,
    sse::{SessionConfig, StreamSession},
    transport::EventTransport,
};

/// Default API base of [`EventClient::openai`].
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1/";

/// Creates stream sessions against one API.
#[derive(Debug, Clone)]
pub struct EventClient<T, P> {
    base: Url,
    transport: T,
    provider: P,
    retry: Duration,
    deadline: Option<Duration>,
    headers: HeaderMap,
}

impl<T, P> EventClient<T, P>
where
    T: EventTransport + Clone,
    P: HeaderProvider + Clone,
{
    /// Create a client for `base`.
    ///
    /// A trailing `/` is added to the base path when missing so that
    /// subscription paths are joined under it rather than replacing its last
    /// segment.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `base` is not a valid URL.
    pub fn new(base: &str, transport: T, provider: P) -> StreamResult<Self> {
        let mut base = Url::parse(base)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            base,
            transport,
            provider,
            retry: SessionConfig::default().retry,
            deadline: None,
            headers: HeaderMap::new(),
        })
    }

    /// Set the retry interval of new sessions.
    #[must_use]
    pub fn retry(mut self, retry: Duration) -> Self {
        self.retry = retry;
        self
    }

    /// Bound the lifetime of new sessions.
    #[must_use]
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Extra headers sent by new sessions.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// The base URL subscriptions are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Resolve `path` against the base URL and request streaming.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the path cannot be joined.
    pub fn subscription_url(&self, path: &str) -> StreamResult<Url> {
        let mut url = self.base.join(path.trim_start_matches('/'))?;
        url.query_pairs_mut().append_pair("stream", "true");
        Ok(url)
    }

    /// Session configuration for `path` with this client's defaults.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the path cannot be joined.
    pub fn session_config(&self, path: &str) -> StreamResult<SessionConfig> {
        let url = self.subscription_url(path)?;
        let mut config = SessionConfig::new(url.as_str())
            .retry(self.retry)
            .headers(self.headers.clone());
        if let Some(deadline) = self.deadline {
            config = config.deadline(deadline);
        }
        Ok(config)
    }

    /// Start a new subscription to `path`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the URL or the defaults are invalid.
    pub fn subscribe(&self, path: &str) -> StreamResult<StreamSession<T, P>> {
        let config = self.session_config(path)?;
        self.subscribe_with(config)
    }

    /// Start a new subscription with a caller-tuned configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` is invalid.
    pub fn subscribe_with(&self, config: SessionConfig) -> StreamResult<StreamSession<T, P>> {
        StreamSession::new(config, self.transport.clone(), self.provider.clone())
    }
}

#[cfg(feature = "reqwest")]
impl EventClient<crate::transport::ReqwestTransport, crate::auth::BearerAuth> {
    /// Client for the OpenAI API using a bearer token.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn openai(token: impl Into<String>) -> StreamResult<Self> {
        let transport =
            crate::transport::ReqwestTransport::new(SessionConfig::default().connect_timeout)?;
        Self::new(
            OPENAI_BASE_URL,
            transport,
            crate::auth::BearerAuth::new(token),
        )
    }

    /// Follow the events of a fine-tune job.
    ///
    /// The subscription ends on its own after one hour.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `job_id` does not form a valid URL.
    pub fn fine_tune_events(
        &self,
        job_id: &str,
    ) -> StreamResult<StreamSession<crate::transport::ReqwestTransport, crate::auth::BearerAuth>>
    {
        if job_id.is_empty() {
            return Err(crate::error::StreamError::config(
                "job id cannot be empty",
            ));
        }
        let mut config = self.session_config(&format!("fine-tunes/{job_id}/events"))?;
        if config.deadline.is_none() {
            config = config.deadline(Duration::from_secs(60 * 60));
        }
        self.subscribe_with(config)
    }
}
