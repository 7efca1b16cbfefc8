//! Win32 application exporter.

use crate::error::{ExportError, ExportResult};
use crate::exporter::ObjectExporter;
use crate::manifest::{icon_filename, ManifestWriter};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ix_graph::{Document, GraphApi, GraphResult};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

const APPS_PATH: &str = "deviceAppManagement/mobileApps";
const WIN32_FILTER: &str = "$filter=isof('microsoft.graph.win32LobApp')";

const GROUP_TARGET_TYPE: &str = "#microsoft.graph.groupAssignmentTarget";

const CONTENT_NOTE: &str = "Application content (.intunewin file) cannot be exported via \
     Graph API. Original installer files must be maintained separately for re-import.";

/// Fields copied verbatim from the fetched app when present.
const COPIED_FIELDS: &[&str] = &[
    "createdDateTime",
    "lastModifiedDateTime",
    "fileName",
    "size",
    "installCommandLine",
    "uninstallCommandLine",
    "setupFilePath",
    "minimumFreeDiskSpaceInMB",
    "minimumMemoryInMB",
    "minimumNumberOfProcessors",
    "minimumCpuSpeedInMHz",
    "msiInformation",
];

/// Fields that default to an empty array when absent.
const LIST_FIELDS: &[&str] = &[
    "applicableArchitectures",
    "returnCodes",
    "rules",
    "detectionRules",
    "requirementRules",
];

/// Exports Win32 LOB applications into
/// `exports/Applications/{name}_{id}.json`, with the large icon written
/// alongside as `{name}_icon.png` when present.
pub struct ApplicationExporter {
    api: Arc<dyn GraphApi>,
    writer: ManifestWriter,
    include_assignments: bool,
    /// Group display names resolved this run; failed lookups are cached
    /// too so one unreachable group is queried at most once.
    group_names: RwLock<HashMap<String, Option<String>>>,
}

impl ApplicationExporter {
    pub fn new(api: Arc<dyn GraphApi>, writer: ManifestWriter, include_assignments: bool) -> Self {
        Self {
            api,
            writer,
            include_assignments,
            group_names: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves a group's display name, best effort. Failures are logged
    /// and answered with `None`; they never fail the assignment export.
    async fn resolve_group_name(&self, group_id: &str) -> Option<String> {
        if let Some(cached) = self.group_names.read().await.get(group_id) {
            return cached.clone();
        }

        let path = format!("groups/{}", urlencoding::encode(group_id));
        let resolved = match self.api.get_object(&path).await {
            Ok(group) => group.display_name().map(String::from),
            Err(e) => {
                debug!(group_id, "Could not resolve group name: {}", e);
                None
            }
        };

        self.group_names
            .write()
            .await
            .insert(group_id.to_string(), resolved.clone());
        resolved
    }

    /// Fetches an optional rules sub-resource; any failure is "no data".
    async fn fetch_rules(&self, id: &str, rules: &str) -> Vec<Document> {
        let path = format!("{}/{}/{}", APPS_PATH, urlencoding::encode(id), rules);
        match self.api.try_get_collection(&path).await {
            Ok(Some(docs)) => docs,
            Ok(None) => Vec::new(),
            Err(e) => {
                debug!(id, rules, "Rules sub-resource unavailable: {}", e);
                Vec::new()
            }
        }
    }

    /// Decodes and writes the large icon, recording `iconFile` in the
    /// manifest. Decode or write failure logs a warning and leaves the
    /// manifest without an icon reference.
    fn export_icon(&self, manifest: &mut Document, icon: &Value, display_name: &str) {
        let result = icon
            .get("value")
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(|encoded| {
                BASE64
                    .decode(encoded)
                    .map_err(|e| ExportError::IconDecode(e.to_string()))
            });

        let Some(decoded) = result else {
            return;
        };

        let written = decoded.and_then(|bytes| {
            let file_name = icon_filename(display_name);
            self.writer
                .write_bytes(self.object_type(), &file_name, &bytes)
                .map(|_| file_name)
        });

        match written {
            Ok(file_name) => {
                manifest.insert("iconFile", json!(file_name));
            }
            Err(e) => {
                warn!(display_name, "Failed to export icon: {}", e);
            }
        }
    }
}

#[async_trait]
impl ObjectExporter for ApplicationExporter {
    fn object_type(&self) -> &str {
        "Applications"
    }

    fn writer(&self) -> &ManifestWriter {
        &self.writer
    }

    fn include_assignments(&self) -> bool {
        self.include_assignments
    }

    async fn list_objects(&self) -> GraphResult<Vec<Document>> {
        let path = format!("{}?{}", APPS_PATH, WIN32_FILTER);
        self.api.list_collection(&path).await
    }

    async fn get_object_details(&self, id: &str) -> GraphResult<Document> {
        let path = format!("{}/{}", APPS_PATH, urlencoding::encode(id));
        let mut details = self.api.get_object(&path).await?;

        let detection = self.fetch_rules(id, "detectionRules").await;
        details.insert(
            "detectionRules",
            Value::Array(detection.into_iter().map(Value::from).collect()),
        );
        let requirements = self.fetch_rules(id, "requirementRules").await;
        details.insert(
            "requirementRules",
            Value::Array(requirements.into_iter().map(Value::from).collect()),
        );

        Ok(details)
    }

    async fn get_assignments(&self, id: &str) -> GraphResult<Vec<Document>> {
        let path = format!("{}/{}/assignments", APPS_PATH, urlencoding::encode(id));
        let raw = self.api.list_collection(&path).await?;

        let mut assignments = Vec::with_capacity(raw.len());
        for entry in raw {
            let mut assignment = Document::new();
            assignment.insert("id", entry.get("id").cloned().unwrap_or(Value::Null));
            assignment.insert("intent", entry.get("intent").cloned().unwrap_or(Value::Null));
            assignment.insert(
                "source",
                entry.get("source").cloned().unwrap_or_else(|| json!("direct")),
            );
            let target = entry.get("target").cloned().unwrap_or(Value::Null);

            if target.get("@odata.type").and_then(Value::as_str) == Some(GROUP_TARGET_TYPE) {
                if let Some(group_id) = target.get("groupId").and_then(Value::as_str) {
                    if let Some(name) = self.resolve_group_name(group_id).await {
                        assignment.insert("targetGroupName", json!(name));
                    }
                }
            }

            assignment.insert("target", target);
            assignments.push(assignment.compact());
        }
        Ok(assignments)
    }

    async fn build_manifest(&self, details: Document) -> ExportResult<Document> {
        let mut manifest = Document::new();
        manifest.insert("id", details.get("id").cloned().unwrap_or(Value::Null));
        manifest.insert(
            "displayName",
            details.get("displayName").cloned().unwrap_or(Value::Null),
        );
        manifest.insert(
            "description",
            details.get("description").cloned().unwrap_or_else(|| json!("")),
        );
        manifest.insert(
            "publisher",
            details.get("publisher").cloned().unwrap_or_else(|| json!("")),
        );
        manifest.insert(
            "version",
            details.get("displayVersion").cloned().unwrap_or_else(|| json!("")),
        );

        for field in COPIED_FIELDS {
            if let Some(value) = details.get(field) {
                manifest.insert(*field, value.clone());
            }
        }
        for field in LIST_FIELDS {
            manifest.insert(
                *field,
                details.get(field).cloned().unwrap_or_else(|| json!([])),
            );
        }
        manifest.insert(
            "minimumSupportedOperatingSystem",
            details
                .get("minimumSupportedOperatingSystem")
                .cloned()
                .unwrap_or_else(|| json!({})),
        );
        manifest.insert(
            "requiresReboot",
            details.get("requiresReboot").cloned().unwrap_or(json!(false)),
        );

        let mut manifest = manifest.compact();

        if let Some(icon) = details.get("largeIcon").cloned() {
            let display_name = details.display_name().unwrap_or("Unknown").to_string();
            self.export_icon(&mut manifest, &icon, &display_name);
        }

        manifest.insert("note", json!(CONTENT_NOTE));
        Ok(manifest)
    }
}
