//! Integration tests for the core crate.

use snapshot_core::model::{first_in_progress, reconcile_snapshots, SnapshotInfo};

fn info(owner: &str, id: &str, in_progress: bool) -> SnapshotInfo {
    SnapshotInfo {
        owner_name: owner.into(),
        id: id.into(),
        in_progress,
    }
}

#[test]
fn test_snapshot_info_serde() {
    let wire = r#"{"ownerName":"dev","id":"Snapshot1","inProgress":true}"#;
    let parsed: SnapshotInfo = serde_json::from_str(wire).unwrap();
    assert_eq!(parsed, info("dev", "Snapshot1", true));

    let serialized = serde_json::to_string(&parsed).unwrap();
    assert_eq!(serialized, wire);
}

#[test]
fn reconcile_filters_to_owner_and_sorts_by_id() {
    let server_list = vec![
        info("A", "S2", false),
        info("B", "S1", false),
        info("A", "S1", false),
    ];

    let view = reconcile_snapshots("A", server_list);
    assert_eq!(view, vec![info("A", "S1", false), info("A", "S2", false)]);
}

#[test]
fn reconcile_of_foreign_owner_is_empty() {
    let server_list = vec![info("A", "S1", false)];
    assert!(reconcile_snapshots("C", server_list).is_empty());
}

#[test]
fn first_in_progress_ignores_later_entries() {
    let view = vec![
        info("A", "S1", false),
        info("A", "S2", true),
        info("A", "S3", true),
    ];

    let found = first_in_progress(&view).unwrap();
    assert_eq!(found.id, "S2");
}

#[test]
fn provisional_entry_is_in_progress() {
    let entry = SnapshotInfo::provisional("dev", "Snapshot1");
    assert!(entry.in_progress);
    assert_eq!(entry.owner_name, "dev");
}
