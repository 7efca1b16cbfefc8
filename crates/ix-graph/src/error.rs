//! Error taxonomy for Graph API access.

use thiserror::Error;

/// Errors that can occur talking to the Graph API.
#[derive(Error, Debug, Clone)]
pub enum GraphError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingConfig(Vec<String>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("Request failed with status {status}: {body}")]
    RequestFailed { status: u16, body: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u64),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for Graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

impl GraphError {
    /// Whether this error indicates a missing sub-resource rather than a
    /// real failure. Sub-resource lookups treat this as "no data".
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_enumerates_all_variables() {
        let err = GraphError::MissingConfig(vec![
            "AZURE_TENANT_ID".to_string(),
            "AZURE_CLIENT_SECRET".to_string(),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("AZURE_TENANT_ID"));
        assert!(msg.contains("AZURE_CLIENT_SECRET"));
    }

    #[test]
    fn test_is_not_found() {
        assert!(GraphError::NotFound("x".into()).is_not_found());
        assert!(!GraphError::Timeout("x".into()).is_not_found());
    }
}
