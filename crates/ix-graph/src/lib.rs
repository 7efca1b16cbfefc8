//! # ix-graph
//!
//! Microsoft Graph API plumbing for the Intune exporter: client-credentials
//! authentication with scoped token caching, a bearer-authenticated HTTP
//! client, paginated collection access behind the [`GraphApi`] trait, and
//! the semi-structured [`Document`] payload type.

pub mod auth;
pub mod client;
pub mod document;
pub mod error;
pub mod http;
pub mod secure_string;
pub mod testing;

pub use auth::{ClientCredentials, TokenProvider, DEFAULT_SCOPE};
pub use client::{GraphApi, GraphClient};
pub use document::Document;
pub use error::{GraphError, GraphResult};
pub use http::{HttpClient, HttpConfig};
pub use secure_string::SecureString;
