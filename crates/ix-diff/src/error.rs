//! Diff-layer errors.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors from changelog generation. Per-file read failures while
/// building added/removed entries are NOT errors; they are reported inside
/// the changelog itself.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type DiffResult<T> = Result<T, DiffError>;
