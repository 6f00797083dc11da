use snapshot_core::model::SnapshotInfo;
use snapshot_core::naming::next_snapshot_name;

fn snapshot(id: &str) -> SnapshotInfo {
    SnapshotInfo {
        owner_name: "dev".into(),
        id: id.into(),
        in_progress: false,
    }
}

#[test]
fn empty_list_yields_default_name() {
    assert_eq!(next_snapshot_name(&[]), "Snapshot1");
}

#[test]
fn increments_last_entry() {
    assert_eq!(next_snapshot_name(&[snapshot("Snapshot1")]), "Snapshot2");
    assert_eq!(
        next_snapshot_name(&[snapshot("Snapshot1"), snapshot("Snapshot9")]),
        "Snapshot10"
    );
}

#[test]
fn uses_first_digit_run_anywhere_in_id() {
    assert_eq!(next_snapshot_name(&[snapshot("run42-final")]), "Snapshot43");
    assert_eq!(next_snapshot_name(&[snapshot("2025-backfill")]), "Snapshot2026");
}

#[test]
fn id_without_digits_counts_as_zero() {
    assert_eq!(next_snapshot_name(&[snapshot("baseline")]), "Snapshot1");
}

#[test]
fn digit_run_stops_at_first_non_digit() {
    // Only the first run counts, not all digits in the id.
    assert_eq!(next_snapshot_name(&[snapshot("Snapshot3-of-7")]), "Snapshot4");
}

#[test]
fn oversized_digit_run_counts_as_zero() {
    assert_eq!(
        next_snapshot_name(&[snapshot("Snapshot99999999999999999999999999")]),
        "Snapshot1"
    );
}

#[test]
fn idempotent_for_same_input() {
    let list = vec![snapshot("Snapshot4")];
    assert_eq!(next_snapshot_name(&list), next_snapshot_name(&list));
}
