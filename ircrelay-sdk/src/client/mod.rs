//! HTTP client for the relay's webhook endpoints.
//!
//! Gated behind the `client` cargo feature so crates that only need the
//! shared types do not pull in `reqwest`.

use reqwest::{Client, StatusCode};
use url::Url;

use crate::objects::endpoints::{HEALTH_PATH, PACKETS_FIELD, PUSH_BUILDBOT_PATH, PUSH_COMMIT_PATH};
use crate::objects::{BuildbotPacket, HealthResponse};

/// Errors produced by [`RelayClient`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, connection reset, …).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The relay returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: StatusCode, body: String },

    /// Packets could not be serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Typed client for pushing lines into a running relay.
///
/// Used by commit hooks and CI glue; the relay itself never calls it.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: Client,
    base_url: Url,
}

impl RelayClient {
    /// Create a client for the relay listening at `base_url`
    /// (e.g. `http://localhost:8080`).
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client`.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /push_commit` – every `\n`-separated line of `text` is posted
    /// to the channel verbatim.
    pub async fn push_commit(&self, text: impl Into<String>) -> Result<(), ClientError> {
        let url = self.base_url.join(PUSH_COMMIT_PATH)?;
        let resp = self.http.post(url).body(text.into()).send().await?;
        Self::check(resp).await
    }

    /// `POST /push_buildbot` – sends `packets` the way buildbot's status
    /// push does, as a form-encoded JSON array.
    pub async fn push_buildbot(&self, packets: &[BuildbotPacket]) -> Result<(), ClientError> {
        let url = self.base_url.join(PUSH_BUILDBOT_PATH)?;
        let json = serde_json::to_string(packets)?;
        let resp = self
            .http
            .post(url)
            .form(&[(PACKETS_FIELD, json)])
            .send()
            .await?;
        Self::check(resp).await
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = self.base_url.join(HEALTH_PATH)?;
        let resp = self.http.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(Self::api_error(resp).await);
        }
        Ok(resp.json().await?)
    }

    async fn check(resp: reqwest::Response) -> Result<(), ClientError> {
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::api_error(resp).await)
        }
    }

    async fn api_error(resp: reqwest::Response) -> ClientError {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        ClientError::Api { status, body }
    }
}
