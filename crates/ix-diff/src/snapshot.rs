//! Prior-snapshot sources for changelog generation.

use crate::error::{DiffError, DiffResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Enumerates all `*.json` files under `root`, keyed by path relative to
/// `root`. Ordered map so changelog entry order is deterministic.
pub fn collect_manifest_files(root: &Path) -> DiffResult<BTreeMap<PathBuf, PathBuf>> {
    let mut files = BTreeMap::new();
    if !root.exists() {
        return Ok(files);
    }
    collect_into(root, root, &mut files)?;
    Ok(files)
}

fn collect_into(
    root: &Path,
    dir: &Path,
    files: &mut BTreeMap<PathBuf, PathBuf>,
) -> DiffResult<()> {
    let entries = std::fs::read_dir(dir).map_err(|source| DiffError::Read {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| DiffError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_into(root, &path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "json") {
            let rel = path
                .strip_prefix(root)
                .expect("walked path is under root")
                .to_path_buf();
            files.insert(rel, path);
        }
    }
    Ok(())
}

/// Supplies the prior snapshot's manifest files, keyed by path relative to
/// its root. Pluggable so the backing store (local snapshot directory,
/// object store, version control) is a deployment decision.
pub trait SnapshotSource: Send + Sync {
    fn previous_files(&self, reference: Option<&str>) -> DiffResult<BTreeMap<PathBuf, PathBuf>>;
}

/// No prior state: every current file reports as added. This is the
/// default until a real snapshot source is configured.
#[derive(Debug, Default)]
pub struct EmptySnapshot;

impl SnapshotSource for EmptySnapshot {
    fn previous_files(&self, _reference: Option<&str>) -> DiffResult<BTreeMap<PathBuf, PathBuf>> {
        Ok(BTreeMap::new())
    }
}

/// Snapshot backed by a local directory mirroring the export tree.
#[derive(Debug)]
pub struct DirSnapshot {
    root: PathBuf,
}

impl DirSnapshot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl SnapshotSource for DirSnapshot {
    fn previous_files(&self, _reference: Option<&str>) -> DiffResult<BTreeMap<PathBuf, PathBuf>> {
        collect_manifest_files(&self.root)
    }
}
