//! Device compliance policy exporter.

use crate::error::ExportResult;
use crate::exporter::ObjectExporter;
use crate::manifest::ManifestWriter;
use async_trait::async_trait;
use ix_graph::{Document, GraphApi, GraphResult};
use std::sync::Arc;
use tracing::debug;

const POLICIES_PATH: &str = "deviceManagement/deviceCompliancePolicies";

/// Exports device compliance policies into
/// `exports/CompliancePolicies/{name}_{id}.json`. The manifest is the full
/// fetched payload with null fields dropped.
pub struct CompliancePolicyExporter {
    api: Arc<dyn GraphApi>,
    writer: ManifestWriter,
    include_assignments: bool,
}

impl CompliancePolicyExporter {
    pub fn new(api: Arc<dyn GraphApi>, writer: ManifestWriter, include_assignments: bool) -> Self {
        Self {
            api,
            writer,
            include_assignments,
        }
    }
}

#[async_trait]
impl ObjectExporter for CompliancePolicyExporter {
    fn object_type(&self) -> &str {
        "CompliancePolicies"
    }

    fn writer(&self) -> &ManifestWriter {
        &self.writer
    }

    fn include_assignments(&self) -> bool {
        self.include_assignments
    }

    async fn list_objects(&self) -> GraphResult<Vec<Document>> {
        self.api.list_collection(POLICIES_PATH).await
    }

    async fn get_object_details(&self, id: &str) -> GraphResult<Document> {
        let path = format!("{}/{}", POLICIES_PATH, urlencoding::encode(id));
        self.api.get_object(&path).await
    }

    /// A 404 on the assignments sub-resource means the policy simply has
    /// none; it is not a failure.
    async fn get_assignments(&self, id: &str) -> GraphResult<Vec<Document>> {
        let path = format!("{}/{}/assignments", POLICIES_PATH, urlencoding::encode(id));
        match self.api.try_get_collection(&path).await? {
            Some(assignments) => Ok(assignments),
            None => {
                debug!(id, "No assignments sub-resource for policy");
                Ok(Vec::new())
            }
        }
    }

    async fn build_manifest(&self, details: Document) -> ExportResult<Document> {
        Ok(details.compact())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ix_graph::testing::MockGraphApi;
    use ix_graph::GraphError;
    use serde_json::{json, Value};

    fn writer(dir: &tempfile::TempDir) -> ManifestWriter {
        ManifestWriter::new(dir.path(), true)
    }

    async fn api_with_policy(id: &str, name: &str) -> MockGraphApi {
        let api = MockGraphApi::new();
        api.set_collection(
            POLICIES_PATH,
            vec![json!({"id": id, "displayName": name})],
        )
        .await;
        api.set_object(
            &format!("{}/{}", POLICIES_PATH, id),
            json!({
                "id": id,
                "displayName": name,
                "passwordRequired": true,
                "description": null
            }),
        )
        .await;
        api
    }

    #[tokio::test]
    async fn test_export_without_assignments_has_no_key() {
        let dir = tempfile::tempdir().unwrap();
        let api = api_with_policy("abc-1", "Baseline").await;
        let exporter = CompliancePolicyExporter::new(Arc::new(api), writer(&dir), false);

        let summary = exporter.export_all().await.unwrap();
        assert_eq!(summary.exported.len(), 1);

        let path = dir.path().join("CompliancePolicies/Baseline_abc-1.json");
        let manifest: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(manifest["id"], "abc-1");
        assert_eq!(manifest["passwordRequired"], true);
        assert!(manifest.get("assignments").is_none());
        // Null fields are dropped, not serialized.
        assert!(manifest.get("description").is_none());
    }

    #[tokio::test]
    async fn test_assignments_404_yields_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        // No assignments route registered: the mock answers 404.
        let api = api_with_policy("abc-1", "Baseline").await;
        let exporter = CompliancePolicyExporter::new(Arc::new(api), writer(&dir), true);

        let summary = exporter.export_all().await.unwrap();
        assert_eq!(summary.exported.len(), 1);
        assert!(summary.skipped.is_empty());

        let path = dir.path().join("CompliancePolicies/Baseline_abc-1.json");
        let manifest: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(manifest["assignments"], json!([]));
    }

    #[tokio::test]
    async fn test_assignments_are_embedded() {
        let dir = tempfile::tempdir().unwrap();
        let api = api_with_policy("abc-1", "Baseline").await;
        api.set_collection(
            &format!("{}/abc-1/assignments", POLICIES_PATH),
            vec![json!({"id": "as-1", "target": {"@odata.type": "#microsoft.graph.allDevicesAssignmentTarget"}})],
        )
        .await;
        let exporter = CompliancePolicyExporter::new(Arc::new(api), writer(&dir), true);

        exporter.export_all().await.unwrap();
        let path = dir.path().join("CompliancePolicies/Baseline_abc-1.json");
        let manifest: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(manifest["assignments"][0]["id"], "as-1");
    }

    #[tokio::test]
    async fn test_per_item_failure_skips_not_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockGraphApi::new();
        api.set_collection(
            POLICIES_PATH,
            vec![
                json!({"id": "ok-1", "displayName": "Good"}),
                json!({"id": "bad-1", "displayName": "Broken"}),
            ],
        )
        .await;
        api.set_object(
            &format!("{}/ok-1", POLICIES_PATH),
            json!({"id": "ok-1", "displayName": "Good"}),
        )
        .await;
        api.set_error(
            &format!("{}/bad-1", POLICIES_PATH),
            GraphError::RequestFailed {
                status: 500,
                body: "server error".into(),
            },
        )
        .await;
        let exporter = CompliancePolicyExporter::new(Arc::new(api), writer(&dir), false);

        let summary = exporter.export_all().await.unwrap();
        assert_eq!(summary.exported.len(), 1);
        assert_eq!(summary.skipped.len(), 1);
        assert_eq!(summary.total(), 2);
        assert_eq!(summary.skipped[0].id, "bad-1");
    }

    #[tokio::test]
    async fn test_list_failure_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockGraphApi::new();
        api.set_error(
            POLICIES_PATH,
            GraphError::AuthenticationFailed("bad creds".into()),
        )
        .await;
        let exporter = CompliancePolicyExporter::new(Arc::new(api), writer(&dir), false);

        let err = exporter.export_all().await.unwrap_err();
        assert!(err.to_string().contains("bad creds"));
        // Nothing was written.
        assert!(!dir.path().join("CompliancePolicies").exists());
    }

    #[tokio::test]
    async fn test_duplicate_display_names_get_distinct_files() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockGraphApi::new();
        api.set_collection(
            POLICIES_PATH,
            vec![
                json!({"id": "id-1", "displayName": "Same"}),
                json!({"id": "id-2", "displayName": "Same"}),
            ],
        )
        .await;
        for id in ["id-1", "id-2"] {
            api.set_object(
                &format!("{}/{}", POLICIES_PATH, id),
                json!({"id": id, "displayName": "Same"}),
            )
            .await;
        }
        let exporter = CompliancePolicyExporter::new(Arc::new(api), writer(&dir), false);

        let summary = exporter.export_all().await.unwrap();
        assert_eq!(summary.exported.len(), 2);
        assert!(dir.path().join("CompliancePolicies/Same_id-1.json").exists());
        assert!(dir.path().join("CompliancePolicies/Same_id-2.json").exists());
    }
}
