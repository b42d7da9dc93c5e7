//! The binary fetcher port and its HTTP implementation.

use async_trait::async_trait;
use bytes::Bytes;
use tracing::trace;

use crate::error::{FetchError, FetchResult};

/// Status and body of a completed GET.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for a status in `200..=299`.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a binary GET for a URL.
///
/// A response with any status is `Ok`; classifying status codes is the
/// caller's job. `Err` is reserved for requests that produced no response.
#[async_trait]
pub trait BinaryFetcher: Send + Sync {
    async fn get(&self, url: &str) -> FetchResult<FetchResponse>;
}

/// [`BinaryFetcher`] over HTTP(S), backed by `reqwest`.
#[derive(Clone, Debug, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing client (shared connection pool, custom headers).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BinaryFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> FetchResult<FetchResponse> {
        let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme(parsed.scheme().to_string()));
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        trace!(url, status, bytes = body.len(), "fetched");
        Ok(FetchResponse { status, body })
    }
}
