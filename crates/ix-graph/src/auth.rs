//! OAuth2 client-credentials token provider for Microsoft Graph.

use crate::error::{GraphError, GraphResult};
use crate::secure_string::SecureString;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

/// Default scope when the caller supplies none.
pub const DEFAULT_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Tokens are refreshed this long before their reported expiry.
const EXPIRY_SKEW: Duration = Duration::from_secs(60);

/// Client identity used for the client-credentials grant.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecureString,
}

/// A cached token with its expiry.
#[derive(Clone)]
struct CachedToken {
    access_token: SecureString,
    expires_at: Instant,
}

/// Acquires and caches bearer tokens via the client-credentials flow.
///
/// The cache is keyed by the scope list joined in sorted order and is owned
/// by the provider instance; share the provider with `Arc` rather than
/// through any global state. Cached entries carry an expiry timestamp and
/// are re-acquired once within [`EXPIRY_SKEW`] of expiring.
pub struct TokenProvider {
    client: Client,
    credentials: ClientCredentials,
    cache: RwLock<HashMap<String, CachedToken>>,
    token_url_override: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

impl TokenProvider {
    pub fn new(credentials: ClientCredentials) -> GraphResult<Self> {
        if credentials.client_secret.is_empty() {
            return Err(GraphError::ConfigError("client secret is empty".into()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GraphError::ConfigError(e.to_string()))?;
        Ok(Self {
            client,
            credentials,
            cache: RwLock::new(HashMap::new()),
            token_url_override: None,
        })
    }

    /// Provider with a caller-supplied token endpoint, used by tests to
    /// point at a stub server.
    pub fn with_token_url(credentials: ClientCredentials, token_url: String) -> GraphResult<Self> {
        let mut provider = Self::new(credentials)?;
        provider.token_url_override = Some(token_url);
        Ok(provider)
    }

    fn token_url(&self) -> String {
        if let Some(url) = &self.token_url_override {
            return url.clone();
        }
        format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            self.credentials.tenant_id
        )
    }

    /// Returns a bearer token for the given scopes, defaulting to the
    /// Graph `.default` scope. Cache hits within the expiry window return
    /// the stored token without a network round trip.
    pub async fn get_token(&self, scopes: Option<&[String]>) -> GraphResult<SecureString> {
        let scopes: Vec<String> = match scopes {
            Some(s) if !s.is_empty() => s.to_vec(),
            _ => vec![DEFAULT_SCOPE.to_string()],
        };

        let cache_key = {
            let mut sorted = scopes.clone();
            sorted.sort();
            sorted.join("|")
        };

        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&cache_key) {
                if entry.expires_at > Instant::now() + EXPIRY_SKEW {
                    debug!(scopes = %cache_key, "Token cache hit");
                    return Ok(entry.access_token.clone());
                }
                debug!(scopes = %cache_key, "Cached token expired, re-acquiring");
            }
        }

        let token = self.acquire(&scopes).await?;

        let mut cache = self.cache.write().await;
        cache.insert(cache_key, token.clone());
        Ok(token.access_token)
    }

    async fn acquire(&self, scopes: &[String]) -> GraphResult<CachedToken> {
        let scope = scopes.join(" ");
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", &self.credentials.client_id),
            ("client_secret", self.credentials.client_secret.expose_secret()),
            ("scope", &scope),
        ];

        let response = self
            .client
            .post(self.token_url())
            .form(&params)
            .send()
            .await
            .map_err(|e| GraphError::AuthenticationFailed(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GraphError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let detail = token_error_detail(status.as_u16(), &body);
            error!("Failed to acquire token: {}", detail);
            return Err(GraphError::AuthenticationFailed(detail));
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| GraphError::InvalidResponse(format!("token response: {}", e)))?;

        info!("Successfully acquired token");
        Ok(CachedToken {
            access_token: SecureString::new(parsed.access_token),
            expires_at: Instant::now() + Duration::from_secs(parsed.expires_in),
        })
    }

    /// Seeds the cache directly. Test hook for exercising cache behavior
    /// without a token endpoint.
    #[doc(hidden)]
    pub async fn seed_cache(&self, scopes: &[String], token: &str, ttl: Duration) {
        let mut sorted: Vec<String> = scopes.to_vec();
        sorted.sort();
        let mut cache = self.cache.write().await;
        cache.insert(
            sorted.join("|"),
            CachedToken {
                access_token: SecureString::from(token),
                expires_at: Instant::now() + ttl,
            },
        );
    }
}

/// Extracts the provider's error description from a failed token
/// response, falling back to the raw error code or HTTP status.
fn token_error_detail(status: u16, body: &str) -> String {
    serde_json::from_str::<TokenErrorResponse>(body)
        .ok()
        .map(|e| {
            if e.error_description.is_empty() {
                e.error
            } else {
                e.error_description
            }
        })
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| format!("token endpoint returned {}", status))
}
