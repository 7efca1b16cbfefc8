//! Manifest file naming and writing.

use crate::error::{ExportError, ExportResult};
use ix_graph::Document;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Replaces every character outside `[alphanumeric, '_', whitespace, '-']`
/// with an underscore. One sanitizer for all object kinds.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace() {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Manifest file name: sanitized display name plus the object ID, which
/// keeps names distinct even when display names collide.
pub fn manifest_filename(display_name: &str, id: &str) -> String {
    format!("{}_{}.json", sanitize_filename(display_name), id)
}

/// Icon file name for an application.
pub fn icon_filename(display_name: &str) -> String {
    format!("{}_icon.png", sanitize_filename(display_name))
}

/// Writes manifests and icon blobs under a single export root.
#[derive(Debug, Clone)]
pub struct ManifestWriter {
    root: PathBuf,
    pretty: bool,
}

impl ManifestWriter {
    pub fn new(root: impl Into<PathBuf>, pretty: bool) -> Self {
        Self {
            root: root.into(),
            pretty,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serializes a manifest into `{root}/{subdir}/{file_name}` and returns
    /// the written path.
    pub fn write(&self, subdir: &str, file_name: &str, manifest: &Document) -> ExportResult<PathBuf> {
        let json = if self.pretty {
            serde_json::to_vec_pretty(manifest)?
        } else {
            serde_json::to_vec(manifest)?
        };
        self.write_bytes(subdir, file_name, &json)
    }

    /// Writes raw bytes (icon payloads) under the export root.
    pub fn write_bytes(&self, subdir: &str, file_name: &str, bytes: &[u8]) -> ExportResult<PathBuf> {
        let dir = self.root.join(subdir);
        fs::create_dir_all(&dir).map_err(|source| ExportError::Io {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(file_name);
        fs::write(&path, bytes).map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Wrote export file");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sanitize_keeps_word_chars_whitespace_hyphen() {
        assert_eq!(sanitize_filename("Baseline Policy-v2_1"), "Baseline Policy-v2_1");
        assert_eq!(sanitize_filename("App/Name:2024"), "App_Name_2024");
        assert_eq!(sanitize_filename("7-Zip (x64)"), "7-Zip _x64_");
    }

    #[test]
    fn test_duplicate_names_distinct_filenames() {
        let a = manifest_filename("Baseline", "id-1");
        let b = manifest_filename("Baseline", "id-2");
        assert_ne!(a, b);
        assert_eq!(a, "Baseline_id-1.json");
    }

    #[test]
    fn test_write_pretty_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ManifestWriter::new(dir.path(), true);
        let doc = Document::try_from(json!({"id": "x", "displayName": "Doc"})).unwrap();

        let path = writer.write("CompliancePolicies", "Doc_x.json", &doc).unwrap();
        assert!(path.ends_with("CompliancePolicies/Doc_x.json"));

        let read: Document =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, doc);
    }

    #[test]
    fn test_write_compact_has_no_indentation() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ManifestWriter::new(dir.path(), false);
        let doc = Document::try_from(json!({"id": "x"})).unwrap();
        let path = writer.write("Applications", "x.json", &doc).unwrap();
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(!contents.contains('\n'));
    }
}
