use serde::{Deserialize, Serialize};

/// Server-asserted record describing one snapshot of a pipeline's in-flight
/// records.
///
/// The server owns this record for its whole lifetime; clients only cache
/// read-through copies and replace them wholesale on every reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInfo {
    /// Name of the pipeline that owns the snapshot.
    pub owner_name: String,
    /// Snapshot name, unique per owner at any instant.
    ///
    /// Uniqueness does not hold across time: a deleted name may be reused.
    pub id: String,
    /// True from capture-start until the buffer is fully written.
    pub in_progress: bool,
}

impl SnapshotInfo {
    /// Builds the provisional entry a client appends right after a
    /// successful capture-start, before the server list reflects it.
    pub fn provisional(owner_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            owner_name: owner_name.into(),
            id: id.into(),
            in_progress: true,
        }
    }
}

/// Reduces a server-provided snapshot list to the view for one pipeline:
/// entries owned by `pipeline`, sorted ascending by `id`.
pub fn reconcile_snapshots(pipeline: &str, all: Vec<SnapshotInfo>) -> Vec<SnapshotInfo> {
    let mut filtered: Vec<SnapshotInfo> = all
        .into_iter()
        .filter(|s| s.owner_name == pipeline)
        .collect();
    filtered.sort_by(|a, b| a.id.cmp(&b.id));
    filtered
}

/// First in-progress entry of a reconciled list.
///
/// The server may transiently report more than one; the first is treated as
/// authoritative and the rest are ignored.
pub fn first_in_progress(snapshots: &[SnapshotInfo]) -> Option<&SnapshotInfo> {
    snapshots.iter().find(|s| s.in_progress)
}
