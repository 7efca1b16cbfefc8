//! End-to-end flow: export against a mock Graph API, then generate
//! changelogs over the resulting export tree.

use ix_diff::{ChangeLog, DiffGenerator, DirSnapshot, EmptySnapshot, LATEST_FILE};
use ix_export::{
    ApplicationExporter, CompliancePolicyExporter, ManifestWriter, ObjectExporter,
};
use ix_graph::testing::MockGraphApi;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

async fn seeded_api() -> MockGraphApi {
    let api = MockGraphApi::new();

    api.set_collection(
        "deviceManagement/deviceCompliancePolicies",
        vec![json!({"id": "pol-1", "displayName": "Baseline"})],
    )
    .await;
    api.set_object(
        "deviceManagement/deviceCompliancePolicies/pol-1",
        json!({"id": "pol-1", "displayName": "Baseline", "passwordRequired": true}),
    )
    .await;

    api.set_collection(
        "deviceAppManagement/mobileApps?$filter=isof('microsoft.graph.win32LobApp')",
        vec![json!({"id": "app-1", "displayName": "7-Zip"})],
    )
    .await;
    api.set_object(
        "deviceAppManagement/mobileApps/app-1",
        json!({"id": "app-1", "displayName": "7-Zip", "displayVersion": "23.01"}),
    )
    .await;
    api.set_collection("deviceAppManagement/mobileApps/app-1/assignments", vec![])
        .await;

    api
}

async fn export_everything(api: Arc<MockGraphApi>, root: &Path) {
    let writer = ManifestWriter::new(root, true);
    let policies = CompliancePolicyExporter::new(api.clone(), writer.clone(), true);
    let summary = policies.export_all().await.unwrap();
    assert_eq!(summary.exported.len(), 1);

    let apps = ApplicationExporter::new(api, writer, true);
    let summary = apps.export_all().await.unwrap();
    assert_eq!(summary.exported.len(), 1);
}

fn read_latest(logs: &Path) -> ChangeLog {
    serde_json::from_str(&std::fs::read_to_string(logs.join(LATEST_FILE)).unwrap()).unwrap()
}

#[tokio::test]
async fn test_first_run_reports_all_added() {
    let exports = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    export_everything(Arc::new(seeded_api().await), exports.path()).await;

    let generator = DiffGenerator::new(exports.path(), logs.path(), Box::new(EmptySnapshot));
    let log = generator.generate(None).unwrap();

    assert_eq!(log.added.len(), 2);
    assert!(log.removed.is_empty());
    assert!(log.modified.is_empty());

    let types: Vec<&str> = log.added.iter().map(|e| e.object_type.as_str()).collect();
    assert!(types.contains(&"CompliancePolicies"));
    assert!(types.contains(&"Applications"));
}

#[tokio::test]
async fn test_reexport_against_snapshot_is_quiet_then_sees_change() {
    let exports = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    let api = Arc::new(seeded_api().await);
    export_everything(api.clone(), exports.path()).await;

    // Snapshot the tree, re-export unchanged data: no changes.
    let snapshot = tempfile::tempdir().unwrap();
    copy_tree(exports.path(), snapshot.path());
    export_everything(api.clone(), exports.path()).await;

    let generator = DiffGenerator::new(
        exports.path(),
        logs.path(),
        Box::new(DirSnapshot::new(snapshot.path())),
    );
    generator.generate(Some("snap-1")).unwrap();
    let latest = read_latest(logs.path());
    assert_eq!(latest.total_changes(), 0);

    // Upstream policy changes; the diff reports exactly that field.
    api.set_object(
        "deviceManagement/deviceCompliancePolicies/pol-1",
        json!({"id": "pol-1", "displayName": "Baseline", "passwordRequired": false}),
    )
    .await;
    export_everything(api, exports.path()).await;

    let generator = DiffGenerator::new(
        exports.path(),
        logs.path(),
        Box::new(DirSnapshot::new(snapshot.path())),
    );
    generator.generate(Some("snap-1")).unwrap();
    let latest = read_latest(logs.path());
    assert_eq!(latest.modified.len(), 1);
    let changes = latest.modified[0].changes.as_ref().unwrap();
    assert_eq!(changes["passwordRequired"].old, Some(json!(true)));
    assert_eq!(changes["passwordRequired"].new, Some(json!(false)));
}

fn copy_tree(from: &Path, to: &Path) {
    for entry in std::fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            std::fs::create_dir_all(&target).unwrap();
            copy_tree(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), target).unwrap();
        }
    }
}
