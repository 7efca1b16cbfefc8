//! Changelog generation: compares the export tree against a prior
//! snapshot and persists the structured change report.

use crate::diff::{diff_documents, FieldDiff};
use crate::error::{DiffError, DiffResult};
use crate::snapshot::{collect_manifest_files, SnapshotSource};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// File name the most recent changelog is always available under.
pub const LATEST_FILE: &str = "latest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Added,
    Removed,
    Modified,
}

/// One changed object in the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeLogEntry {
    /// Derived from the manifest's containing directory name.
    pub object_type: String,
    pub display_name: String,
    pub object_id: String,
    pub change_type: ChangeType,
    /// Field-level diffs; present only on modified entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<BTreeMap<String, FieldDiff>>,
}

/// The full change report for one run.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChangeLog {
    /// UTC generation time, ISO-8601.
    pub timestamp: String,
    /// Identifier of the compared prior state, when one was given.
    pub reference: Option<String>,
    pub added: Vec<ChangeLogEntry>,
    pub removed: Vec<ChangeLogEntry>,
    pub modified: Vec<ChangeLogEntry>,
}

impl ChangeLog {
    pub fn total_changes(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }
}

/// Generates and persists changelogs for an export tree.
pub struct DiffGenerator {
    export_root: PathBuf,
    changelog_dir: PathBuf,
    source: Box<dyn SnapshotSource>,
}

impl DiffGenerator {
    pub fn new(
        export_root: impl Into<PathBuf>,
        changelog_dir: impl Into<PathBuf>,
        source: Box<dyn SnapshotSource>,
    ) -> Self {
        Self {
            export_root: export_root.into(),
            changelog_dir: changelog_dir.into(),
            source,
        }
    }

    /// Compares the current export tree against the snapshot source,
    /// persists the changelog under a timestamped name plus
    /// [`LATEST_FILE`], and returns it.
    pub fn generate(&self, reference: Option<&str>) -> DiffResult<ChangeLog> {
        let current = collect_manifest_files(&self.export_root)?;
        let previous = self.source.previous_files(reference)?;

        let mut log = ChangeLog {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            reference: reference.map(String::from),
            added: Vec::new(),
            removed: Vec::new(),
            modified: Vec::new(),
        };

        for (rel, path) in &current {
            if !previous.contains_key(rel) {
                log.added.push(read_entry(rel, path, ChangeType::Added));
            }
        }
        for (rel, path) in &previous {
            if !current.contains_key(rel) {
                log.removed.push(read_entry(rel, path, ChangeType::Removed));
            }
        }
        for (rel, new_path) in &current {
            let Some(old_path) = previous.get(rel) else {
                continue;
            };
            if let Some(entry) = compare_files(rel, old_path, new_path) {
                log.modified.push(entry);
            }
        }

        self.persist(&log)?;

        info!(
            added = log.added.len(),
            removed = log.removed.len(),
            modified = log.modified.len(),
            "Change log generated"
        );
        if log.total_changes() == 0 {
            info!("No changes detected");
        }
        Ok(log)
    }

    fn persist(&self, log: &ChangeLog) -> DiffResult<()> {
        std::fs::create_dir_all(&self.changelog_dir).map_err(|source| DiffError::Write {
            path: self.changelog_dir.clone(),
            source,
        })?;

        let json = serde_json::to_vec_pretty(log)?;
        let stamped = self
            .changelog_dir
            .join(format!("changelog_{}.json", Utc::now().format("%Y%m%d_%H%M%S")));
        std::fs::write(&stamped, &json).map_err(|source| DiffError::Write {
            path: stamped.clone(),
            source,
        })?;

        let latest = self.changelog_dir.join(LATEST_FILE);
        std::fs::write(&latest, &json).map_err(|source| DiffError::Write {
            path: latest.clone(),
            source,
        })?;
        Ok(())
    }
}

/// Object type is the manifest's containing directory name.
fn object_type_of(rel: &Path) -> String {
    rel.parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Builds an added/removed entry from the manifest on disk. A read or
/// parse failure is reported inside the entry rather than dropping the
/// change.
fn read_entry(rel: &Path, path: &Path, change_type: ChangeType) -> ChangeLogEntry {
    match read_document(path) {
        Ok(doc) => ChangeLogEntry {
            object_type: object_type_of(rel),
            display_name: str_field(&doc, "displayName"),
            object_id: str_field(&doc, "id"),
            change_type,
            changes: None,
        },
        Err(e) => {
            error!(path = %path.display(), "Error reading file: {}", e);
            ChangeLogEntry {
                object_type: object_type_of(rel),
                display_name: "Error reading file".to_string(),
                object_id: "Unknown".to_string(),
                change_type,
                changes: None,
            }
        }
    }
}

/// Diffs two manifest versions; `None` when they are equal (or unreadable,
/// which is logged and treated as not-compared).
fn compare_files(rel: &Path, old_path: &Path, new_path: &Path) -> Option<ChangeLogEntry> {
    let (old, new) = match (read_document(old_path), read_document(new_path)) {
        (Ok(old), Ok(new)) => (old, new),
        (old, new) => {
            if let Err(e) = old {
                error!(path = %old_path.display(), "Error comparing files: {}", e);
            }
            if let Err(e) = new {
                error!(path = %new_path.display(), "Error comparing files: {}", e);
            }
            return None;
        }
    };

    let changes = diff_documents(&old, &new);
    if changes.is_empty() {
        return None;
    }
    Some(ChangeLogEntry {
        object_type: object_type_of(rel),
        display_name: str_field(&new, "displayName"),
        object_id: str_field(&new, "id"),
        change_type: ChangeType::Modified,
        changes: Some(changes),
    })
}

fn read_document(path: &Path) -> Result<Value, String> {
    let text = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&text).map_err(|e| e.to_string())
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string()
}
