//! Open API client for the configuration authority.
//!
//! # Responsibilities
//! - Fetch the managed item's raw response body
//! - Upsert the item with create-if-absent semantics
//! - Publish a release of the namespace
//! - Surface non-2xx responses with their body for diagnosis

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use thiserror::Error;

use crate::config::AgentConfig;
use crate::observability::metrics;
use crate::remote::types::{ConfigItem, Release};

/// Bound on every request to the authority.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Content type the open API expects.
pub const JSON_UTF8: &str = "application/json;charset=UTF-8";

/// Errors that can occur talking to the authority.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Token cannot be carried in a header.
    #[error("access token is not a valid header value")]
    InvalidToken,

    /// Connection, timeout or body read failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Authority answered with a non-success status.
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: StatusCode,
        body: String,
    },

    /// Response body is not a configuration item.
    #[error("malformed response: {source}; body: {body}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },

    /// Request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Authenticated client scoped to one environment/app/cluster/namespace.
#[derive(Clone)]
pub struct ConfigClient {
    http: reqwest::Client,
    headers: HeaderMap,
    item_url: String,
    release_url: String,
    timeout: Duration,
}

impl ConfigClient {
    /// Create a client with the standard request timeout.
    pub fn new(config: &AgentConfig) -> Result<Self, RemoteError> {
        Self::with_timeout(config, REQUEST_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    pub fn with_timeout(config: &AgentConfig, timeout: Duration) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RemoteError::Client)?;

        let mut token =
            HeaderValue::from_str(config.token.trim()).map_err(|_| RemoteError::InvalidToken)?;
        token.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));

        Ok(Self {
            http,
            headers,
            item_url: config.item_url(),
            release_url: config.release_url(),
            timeout,
        })
    }

    /// GET the managed item and return the full response body.
    pub async fn fetch(&self) -> Result<String, RemoteError> {
        self.send("fetch", Method::GET, self.item_url.clone(), None)
            .await
    }

    /// PUT `item`, creating it when the authority does not have it yet.
    pub async fn upsert(&self, item: &ConfigItem) -> Result<(), RemoteError> {
        let body = serde_json::to_vec(item).map_err(RemoteError::Encode)?;
        let url = format!("{}?createIfNotExists=true", self.item_url);
        self.send("upsert", Method::PUT, url, Some(body)).await?;
        Ok(())
    }

    /// POST a release of the namespace.
    pub async fn publish(&self, release: &Release) -> Result<(), RemoteError> {
        let body = serde_json::to_vec(release).map_err(RemoteError::Encode)?;
        self.send("publish", Method::POST, self.release_url.clone(), Some(body))
            .await?;
        Ok(())
    }

    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        url: String,
        body: Option<Vec<u8>>,
    ) -> Result<String, RemoteError> {
        let mut request = self
            .http
            .request(method.clone(), &url)
            .headers(self.headers.clone());
        if let Some(body) = body {
            request = request.body(body);
        }

        let result = async {
            let response = request.send().await.map_err(|source| RemoteError::Transport {
                url: url.clone(),
                source,
            })?;

            let status = response.status();
            // Body is read in full before the status decides anything.
            let text = response.text().await.map_err(|source| RemoteError::Transport {
                url: url.clone(),
                source,
            })?;

            if !status.is_success() {
                return Err(RemoteError::Status {
                    url: url.clone(),
                    status,
                    body: text,
                });
            }
            Ok::<String, RemoteError>(text)
        }
        .await;

        match &result {
            Ok(_) => {
                metrics::record_remote_request(operation, "ok");
                tracing::debug!(%method, url = %url, "Authority request succeeded");
            }
            Err(RemoteError::Status { status, .. }) => {
                metrics::record_remote_request(operation, "status");
                tracing::debug!(%method, url = %url, %status, "Authority returned error status");
            }
            Err(e) => {
                metrics::record_remote_request(operation, "transport");
                tracing::debug!(%method, url = %url, error = %e, "Authority request failed");
            }
        }

        result
    }

    /// Item endpoint this client targets.
    pub fn item_url(&self) -> &str {
        &self.item_url
    }

    /// Release endpoint this client targets.
    pub fn release_url(&self) -> &str {
        &self.release_url
    }
}

impl std::fmt::Debug for ConfigClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigClient")
            .field("item_url", &self.item_url)
            .field("release_url", &self.release_url)
            .field("timeout_secs", &self.timeout.as_secs())
            .finish()
    }
}
