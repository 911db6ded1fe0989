//! HTTP transport seam used by stream sessions.
//!
//! A session only needs one capability from HTTP: send a GET with a set of
//! headers and hand back the status plus a streaming body. [`EventTransport`]
//! captures exactly that, so tests can script responses and applications can
//! plug in their own client. [`ReqwestTransport`] is the stock implementation.

use std::{fmt, pin::Pin, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use futures_core::Stream;

use crate::error::BoxError;

/// Streaming response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// A single connection attempt.
#[derive(Debug, Clone)]
pub struct StreamRequest {
    /// Target URL.
    pub url: String,
    /// Every header to send, framing and auth included.
    pub headers: http::HeaderMap,
}

impl StreamRequest {
    /// Create a request without headers.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: http::HeaderMap::new(),
        }
    }

    /// Look up a header as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Status and body of an opened stream. Dropping it closes the connection.
pub struct StreamResponse {
    /// HTTP status code.
    pub status: http::StatusCode,
    /// Response body as it arrives.
    pub body: ByteStream,
}

impl StreamResponse {
    /// Create a response from a status and any compatible body stream.
    pub fn new<S>(status: http::StatusCode, body: S) -> Self
    where
        S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    {
        Self {
            status,
            body: Box::pin(body),
        }
    }
}

impl fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Opens event-stream connections.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Send the request and wait for the response headers.
    ///
    /// An `Err` means no response was received at all; the session retries
    /// these silently.
    async fn open(&self, request: StreamRequest) -> Result<StreamResponse, BoxError>;
}

#[async_trait]
impl<T: EventTransport + ?Sized> EventTransport for Arc<T> {
    async fn open(&self, request: StreamRequest) -> Result<StreamResponse, BoxError> {
        (**self).open(request).await
    }
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use std::time::Duration;

    use async_trait::async_trait;
    use futures_util::TryStreamExt;

    use super::{EventTransport, StreamRequest, StreamResponse};
    use crate::error::{BoxError, StreamError, StreamResult};

    /// [`EventTransport`] backed by a [`reqwest::Client`].
    ///
    /// The client has a connect timeout but no overall request timeout:
    /// event streams stay open for as long as the job runs.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        /// Build a transport with the given connect timeout.
        ///
        /// # Errors
        ///
        /// Returns a configuration error if the client cannot be built.
        pub fn new(connect_timeout: Duration) -> StreamResult<Self> {
            let client = reqwest::Client::builder()
                .connect_timeout(connect_timeout)
                .build()
                .map_err(|e| StreamError::config(format!("Failed to build HTTP client: {e}")))?;
            Ok(Self { client })
        }

        /// Wrap an existing client.
        pub fn from_client(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl EventTransport for ReqwestTransport {
        async fn open(&self, request: StreamRequest) -> Result<StreamResponse, BoxError> {
            let resp = self
                .client
                .get(&request.url)
                .headers(request.headers)
                .send()
                .await?;

            let status = resp.status();
            let body = resp
                .bytes_stream()
                .map_err(|e| -> BoxError { Box::new(e) });
            Ok(StreamResponse::new(status, body))
        }
    }
}
