//! HTTP client for Graph API calls.
//!
//! Every request is a single attempt: the export batch policy is to
//! propagate failures immediately and let the per-object loop decide
//! whether to skip, so there is no retry or backoff here.

use crate::auth::TokenProvider;
use crate::error::{GraphError, GraphResult};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Graph API base, e.g. `https://graph.microsoft.com`.
    pub base_url: String,
    /// API version path segment, `v1.0` or `beta`.
    pub api_version: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://graph.microsoft.com".to_string(),
            api_version: "v1.0".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Bearer-authenticated HTTP client over a [`TokenProvider`].
pub struct HttpClient {
    client: Client,
    config: HttpConfig,
    tokens: Arc<TokenProvider>,
}

impl HttpClient {
    pub fn new(config: HttpConfig, tokens: Arc<TokenProvider>) -> GraphResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GraphError::ConfigError(e.to_string()))?;
        Ok(Self {
            client,
            config,
            tokens,
        })
    }

    /// Joins the base URL, API version, and a relative path.
    pub fn build_url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_version.trim_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Executes a GET against a versioned relative path.
    pub async fn get(&self, path: &str) -> GraphResult<Response> {
        self.get_url(&self.build_url(path)).await
    }

    /// Executes a GET against an absolute URL (used for `@odata.nextLink`
    /// pagination cursors, which are returned fully qualified).
    pub async fn get_url(&self, url: &str) -> GraphResult<Response> {
        let token = self.tokens.get_token(None).await?;
        let response = self
            .client
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GraphError::Timeout(e.to_string())
                } else if e.is_connect() {
                    GraphError::ConnectionFailed(e.to_string())
                } else {
                    GraphError::RequestFailed {
                        status: 0,
                        body: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::UNAUTHORIZED => Err(GraphError::AuthenticationFailed(
                "Unauthorized".to_string(),
            )),
            StatusCode::FORBIDDEN => {
                Err(GraphError::AuthorizationDenied("Forbidden".to_string()))
            }
            StatusCode::NOT_FOUND => Err(GraphError::NotFound(url.to_string())),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                Err(GraphError::RateLimited(retry_after))
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                Err(GraphError::RequestFailed {
                    status: status.as_u16(),
                    body: body.chars().take(500).collect(),
                })
            }
        }
    }

    /// Executes a GET and deserializes the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GraphResult<T> {
        let response = self.get(path).await?;
        Self::parse_json(response).await
    }

    /// Like [`get_json`](Self::get_json) but for absolute URLs.
    pub async fn get_url_json<T: DeserializeOwned>(&self, url: &str) -> GraphResult<T> {
        let response = self.get_url(url).await?;
        Self::parse_json(response).await
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> GraphResult<T> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GraphError::InvalidResponse(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| {
            GraphError::InvalidResponse(format!(
                "Failed to parse response (status {}): {} - Body: {}",
                status,
                e,
                text.chars().take(500).collect::<String>()
            ))
        })
    }
}
