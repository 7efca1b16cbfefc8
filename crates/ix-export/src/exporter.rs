//! Generic export contract and the best-effort batch orchestration.

use crate::error::ExportResult;
use crate::manifest::{manifest_filename, ManifestWriter};
use async_trait::async_trait;
use ix_graph::{Document, GraphResult};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{error, info};

/// A successfully exported object.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedObject {
    pub id: String,
    pub display_name: String,
    pub manifest_path: PathBuf,
}

/// An object that was listed but could not be exported.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedObject {
    pub id: String,
    pub display_name: String,
    pub reason: String,
}

/// Outcome of one batch run. Per-item failures never abort the batch, so
/// partial failure shows up as `skipped` entries rather than an error;
/// compare `exported.len()` against [`total`](Self::total) to detect it.
#[derive(Debug, Default, Serialize)]
pub struct ExportSummary {
    pub exported: Vec<ExportedObject>,
    pub skipped: Vec<SkippedObject>,
}

impl ExportSummary {
    pub fn total(&self) -> usize {
        self.exported.len() + self.skipped.len()
    }

    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Contract shared by the compliance-policy and application exporters.
///
/// `export_all` is provided: it drives list → per-object details,
/// assignments, manifest, write, collecting per-item outcomes. Only the
/// initial list call is fatal; everything after it is per-object.
#[async_trait]
pub trait ObjectExporter: Send + Sync {
    /// Export subdirectory and changelog object type, e.g.
    /// `"CompliancePolicies"`.
    fn object_type(&self) -> &str;

    fn writer(&self) -> &ManifestWriter;

    /// Whether assignments are fetched and embedded in manifests.
    fn include_assignments(&self) -> bool;

    /// Lists object summaries (paginated under the hood).
    async fn list_objects(&self) -> GraphResult<Vec<Document>>;

    /// Fetches the full object, including variant-specific sub-resources.
    async fn get_object_details(&self, id: &str) -> GraphResult<Document>;

    /// Fetches assignments for one object. A missing assignments
    /// sub-resource is empty, not an error.
    async fn get_assignments(&self, id: &str) -> GraphResult<Vec<Document>>;

    /// Normalizes fetched details into the manifest shape. Implementations
    /// must not emit null-valued fields.
    async fn build_manifest(&self, details: Document) -> ExportResult<Document>;

    /// Exports every listed object, skipping (and logging) per-object
    /// failures. Fails only when the listing itself fails.
    async fn export_all(&self) -> ExportResult<ExportSummary> {
        let objects = self.list_objects().await?;
        info!(
            object_type = self.object_type(),
            count = objects.len(),
            "Listed objects for export"
        );

        let mut summary = ExportSummary::default();
        for object in objects {
            let id = match object.id() {
                Some(id) => id.to_string(),
                None => {
                    error!(object_type = self.object_type(), "Listed object has no id");
                    summary.skipped.push(SkippedObject {
                        id: String::new(),
                        display_name: object.display_name().unwrap_or("Unknown").to_string(),
                        reason: "missing id".to_string(),
                    });
                    continue;
                }
            };
            let display_name = object.display_name().unwrap_or("Unknown").to_string();

            match self.export_one(&id).await {
                Ok(path) => {
                    info!(
                        object_type = self.object_type(),
                        display_name, "Exported object"
                    );
                    summary.exported.push(ExportedObject {
                        id,
                        display_name,
                        manifest_path: path,
                    });
                }
                Err(e) => {
                    error!(
                        object_type = self.object_type(),
                        id, "Failed to export object: {}", e
                    );
                    summary.skipped.push(SkippedObject {
                        id,
                        display_name,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            object_type = self.object_type(),
            exported = summary.exported.len(),
            skipped = summary.skipped.len(),
            "Export batch finished"
        );
        Ok(summary)
    }

    /// Exports a single object and returns the manifest path.
    async fn export_one(&self, id: &str) -> ExportResult<PathBuf> {
        let details = self.get_object_details(id).await?;
        let mut manifest = self.build_manifest(details).await?;

        if self.include_assignments() {
            let assignments = self.get_assignments(id).await?;
            let values: Vec<Value> = assignments.into_iter().map(Value::from).collect();
            manifest.insert("assignments", Value::Array(values));
        }

        let display_name = manifest.display_name().unwrap_or("Unknown").to_string();
        let file_name = manifest_filename(&display_name, id);
        self.writer().write(self.object_type(), &file_name, &manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = ExportSummary::default();
        assert!(summary.is_complete());
        summary.exported.push(ExportedObject {
            id: "a".into(),
            display_name: "A".into(),
            manifest_path: PathBuf::from("a.json"),
        });
        summary.skipped.push(SkippedObject {
            id: "b".into(),
            display_name: "B".into(),
            reason: "boom".into(),
        });
        assert_eq!(summary.total(), 2);
        assert!(!summary.is_complete());
    }
}
