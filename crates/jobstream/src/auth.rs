//! Default header providers.
//!
//! The enclosing API client knows the credentials; a stream session only asks
//! it for headers before every connection attempt, so rotated tokens are
//! picked up on reconnect.

use std::sync::Arc;

use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue, header};

use crate::error::{StreamError, StreamResult};

/// Header carrying the organization id.
pub const ORGANIZATION_HEADER: &str = "openai-organization";

/// Default `User-Agent` sent by [`BearerAuth`].
pub const DEFAULT_USER_AGENT: &str = concat!("jobstream/", env!("CARGO_PKG_VERSION"));

/// Supplies the headers attached to every connection attempt.
#[async_trait]
pub trait HeaderProvider: Send + Sync + std::fmt::Debug {
    /// Add this provider's headers to `headers`.
    async fn apply(&self, headers: &mut HeaderMap) -> StreamResult<()>;
}

#[async_trait]
impl<P: HeaderProvider + ?Sized> HeaderProvider for Arc<P> {
    async fn apply(&self, headers: &mut HeaderMap) -> StreamResult<()> {
        (**self).apply(headers).await
    }
}

/// No authentication
#[derive(Debug, Clone, Default)]
pub struct NoAuth;

#[async_trait]
impl HeaderProvider for NoAuth {
    async fn apply(&self, _headers: &mut HeaderMap) -> StreamResult<()> {
        Ok(())
    }
}

/// Bearer token authentication with an optional organization id.
#[derive(Clone)]
pub struct BearerAuth {
    token: String,
    organization: Option<String>,
    user_agent: String,
}

impl BearerAuth {
    /// Create a new bearer token authentication.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            organization: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    /// Scope requests to an organization.
    #[must_use]
    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Override the `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

impl std::fmt::Debug for BearerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerAuth")
            .field("token", &"<redacted>")
            .field("organization", &self.organization)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[async_trait]
impl HeaderProvider for BearerAuth {
    async fn apply(&self, headers: &mut HeaderMap) -> StreamResult<()> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.token))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(header::USER_AGENT, HeaderValue::from_str(&self.user_agent)?);

        if let Some(org) = self.organization.as_deref().filter(|org| !org.is_empty()) {
            headers.insert(
                HeaderName::from_static(ORGANIZATION_HEADER),
                HeaderValue::from_str(org)?,
            );
        }
        Ok(())
    }
}

/// A fixed set of headers.
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders(HeaderMap);

impl StaticHeaders {
    /// Use `headers` as the fixed set.
    pub fn new(headers: HeaderMap) -> Self {
        Self(headers)
    }

    /// Build from string pairs.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an invalid header name or value.
    pub fn from_pairs<I, K, V>(pairs: I) -> StreamResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            let name = HeaderName::from_bytes(name.as_ref().as_bytes())
                .map_err(|e| StreamError::config(format!("invalid header name: {e}")))?;
            headers.append(name, HeaderValue::from_str(value.as_ref())?);
        }
        Ok(Self(headers))
    }
}

#[async_trait]
impl HeaderProvider for StaticHeaders {
    async fn apply(&self, headers: &mut HeaderMap) -> StreamResult<()> {
        merge_headers(headers, &self.0);
        Ok(())
    }
}

/// Copy `overrides` into `headers`; names present in `overrides` replace
/// every existing value, repeated names keep all their values.
pub(crate) fn merge_headers(headers: &mut HeaderMap, overrides: &HeaderMap) {
    for name in overrides.keys() {
        headers.remove(name);
    }
    for (name, value) in overrides {
        headers.append(name.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_headers_overrides_and_keeps_repeats() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("default"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("text/event-stream"));

        let mut overrides = HeaderMap::new();
        overrides.append(header::USER_AGENT, HeaderValue::from_static("custom"));
        overrides.append("x-tag", HeaderValue::from_static("a"));
        overrides.append("x-tag", HeaderValue::from_static("b"));

        merge_headers(&mut headers, &overrides);

        assert_eq!(
            headers.get_all(header::USER_AGENT).iter().collect::<Vec<_>>(),
            vec!["custom"]
        );
        assert_eq!(headers.get_all("x-tag").iter().count(), 2);
        assert_eq!(
            headers.get(header::ACCEPT).map(|v| v.to_str().expect("str")),
            Some("text/event-stream")
        );
    }

    #[tokio::test]
    async fn test_no_auth_adds_nothing() {
        let mut headers = HeaderMap::new();
        NoAuth.apply(&mut headers).await.expect("apply");
        assert!(headers.is_empty());
    }

    #[tokio::test]
    async fn test_bearer_auth_headers() {
        let auth = BearerAuth::new("sk-test").organization("org-123");
        let mut headers = HeaderMap::new();
        auth.apply(&mut headers).await.expect("apply");

        assert_eq!(
            headers.get(header::AUTHORIZATION).map(|v| v.to_str().expect("str")),
            Some("Bearer sk-test")
        );
        assert!(headers.get(header::AUTHORIZATION).expect("auth").is_sensitive());
        assert_eq!(
            headers.get(ORGANIZATION_HEADER).map(|v| v.to_str().expect("str")),
            Some("org-123")
        );
        assert_eq!(
            headers.get(header::USER_AGENT).map(|v| v.to_str().expect("str")),
            Some(DEFAULT_USER_AGENT)
        );
    }

    #[tokio::test]
    async fn test_bearer_auth_without_organization() {
        let auth = BearerAuth::new("sk-test").organization("");
        let mut headers = HeaderMap::new();
        auth.apply(&mut headers).await.expect("apply");
        assert!(headers.get(ORGANIZATION_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_bearer_auth_rejects_invalid_token() {
        let auth = BearerAuth::new("bad\ntoken");
        let mut headers = HeaderMap::new();
        let err = auth.apply(&mut headers).await.expect_err("should fail");
        assert!(matches!(err, StreamError::Config { .. }));
    }

    #[test]
    fn test_bearer_debug_redacts_token() {
        let debug = format!("{:?}", BearerAuth::new("sk-secret"));
        assert!(!debug.contains("sk-secret"));
    }

    #[tokio::test]
    async fn test_static_headers() {
        let provider =
            StaticHeaders::from_pairs([("X-Job", "ft-1"), ("X-Trace", "abc")]).expect("headers");
        let mut headers = HeaderMap::new();
        provider.apply(&mut headers).await.expect("apply");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("x-job").map(|v| v.to_str().expect("str")), Some("ft-1"));

        assert!(StaticHeaders::from_pairs([("bad header", "x")]).is_err());
    }
}
