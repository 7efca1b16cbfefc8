//! Environment-driven configuration.
//!
//! Identity credentials come from `AZURE_*` variables (a `.env` file is
//! honored); every other setting has a default. Boolean variables accept
//! only the case-insensitive literal `true`; anything else, including
//! garbage, is false.

use ix_graph::{ClientCredentials, GraphError, SecureString};
use std::path::PathBuf;

const REQUIRED_VARS: &[&str] = &["AZURE_TENANT_ID", "AZURE_CLIENT_ID", "AZURE_CLIENT_SECRET"];

/// Azure AD application identity.
#[derive(Debug, Clone)]
pub struct AzureConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecureString,
}

impl AzureConfig {
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials {
            tenant_id: self.tenant_id.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }
}

/// Graph API selection.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub api_version: String,
    pub beta_enabled: bool,
}

impl GraphConfig {
    /// The version segment used in request URLs; the beta toggle wins
    /// over the configured version.
    pub fn effective_version(&self) -> &str {
        if self.beta_enabled {
            "beta"
        } else {
            &self.api_version
        }
    }
}

/// Export behavior toggles.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub pretty_print: bool,
    pub include_assignments: bool,
    pub root: PathBuf,
}

/// Changelog output location.
#[derive(Debug, Clone)]
pub struct ChangelogConfig {
    pub dir: PathBuf,
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub azure: AzureConfig,
    pub graph: GraphConfig,
    pub export: ExportConfig,
    pub changelog: ChangelogConfig,
}

impl AppConfig {
    /// Loads configuration from the process environment, honoring a
    /// `.env` file when present. Missing required variables are reported
    /// together in one error.
    pub fn from_env() -> Result<Self, GraphError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Configuration from an arbitrary variable lookup. Seam for tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, GraphError> {
        let missing: Vec<String> = REQUIRED_VARS
            .iter()
            .filter(|name| lookup(name).map_or(true, |v| v.is_empty()))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(GraphError::MissingConfig(missing));
        }

        let get = |name: &str| lookup(name).unwrap_or_default();
        Ok(Self {
            azure: AzureConfig {
                tenant_id: get("AZURE_TENANT_ID"),
                client_id: get("AZURE_CLIENT_ID"),
                client_secret: SecureString::new(get("AZURE_CLIENT_SECRET")),
            },
            graph: GraphConfig {
                api_version: lookup("GRAPH_API_VERSION").unwrap_or_else(|| "v1.0".to_string()),
                beta_enabled: bool_var(lookup("GRAPH_API_BETA_ENABLED"), false),
            },
            export: ExportConfig {
                pretty_print: bool_var(lookup("EXPORT_PRETTY_PRINT"), true),
                include_assignments: bool_var(lookup("EXPORT_INCLUDE_ASSIGNMENTS"), true),
                root: lookup("EXPORT_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("exports")),
            },
            changelog: ChangelogConfig {
                dir: lookup("CHANGELOG_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from("change_logs")),
            },
        })
    }
}

/// Permissive boolean parsing: only the literal `true` (any case) is true;
/// an unset variable takes the default.
fn bool_var(value: Option<String>, default: bool) -> bool {
    match value {
        Some(v) => v.eq_ignore_ascii_case("true"),
        None => default,
    }
}
