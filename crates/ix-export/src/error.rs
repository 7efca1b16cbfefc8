//! Export-layer errors.

use ix_graph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from the export pipeline. Manifest and icon writes share the
/// same `Io` path; the icon caller downgrades it to a warning.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Icon decode failed: {0}")]
    IconDecode(String),
}

pub type ExportResult<T> = Result<T, ExportError>;
