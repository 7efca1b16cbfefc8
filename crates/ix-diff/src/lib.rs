//! # ix-diff
//!
//! Snapshot comparison for exported manifests. Enumerates the current
//! export tree, pulls the prior state from a pluggable [`SnapshotSource`],
//! computes per-object structural diffs, and persists the changelog under
//! a timestamped name plus a fixed `latest.json`.

pub mod changelog;
pub mod diff;
pub mod error;
pub mod snapshot;

pub use changelog::{ChangeLog, ChangeLogEntry, ChangeType, DiffGenerator, LATEST_FILE};
pub use diff::{diff_documents, FieldDiff, EXCLUDED_FIELDS};
pub use error::{DiffError, DiffResult};
pub use snapshot::{collect_manifest_files, DirSnapshot, EmptySnapshot, SnapshotSource};
