use log::{debug, warn};
use serde_json::json;

/// Decides whether an API key may use the pipeline.
///
/// `Ok(false)` is a rejection; `Err` means the backend could not answer.
#[async_trait::async_trait]
pub trait KeyVerifier: Send + Sync {
    async fn verify(&self, api_key: &str) -> anyhow::Result<bool>;
}

/// Accepts every key.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubVerifier;

#[async_trait::async_trait]
impl KeyVerifier for StubVerifier {
    async fn verify(&self, _api_key: &str) -> anyhow::Result<bool> {
        Ok(true)
    }
}

/// Verifies keys against an HTTP endpoint.
///
/// REQUEST:
/// - `POST <url>` with body `{"apiKey": "<key>"}`
///
/// VERDICT:
/// - any 2xx accepts the key
/// - 401 / 403 reject it
/// - anything else is a backend error
pub struct HttpVerifier {
    url: String,
    client: reqwest::Client,
}

impl HttpVerifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(url, reqwest::Client::new())
    }

    /// Uses a caller-configured client (proxy, TLS, timeouts).
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait::async_trait]
impl KeyVerifier for HttpVerifier {
    async fn verify(&self, api_key: &str) -> anyhow::Result<bool> {
        let resp = self
            .client
            .post(&self.url)
            .json(&json!({ "apiKey": api_key }))
            .send()
            .await?;

        let status = resp.status();
        debug!("verification endpoint answered {}", status);

        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            warn!("api key rejected by {}", self.url);
            Ok(false)
        } else {
            Err(anyhow::anyhow!("unexpected verification status {}", status))
        }
    }
}
