use crate::model::SnapshotInfo;

/// Textual prefix of generated snapshot names.
pub const SNAPSHOT_NAME_PREFIX: &str = "Snapshot";

/// Derives the next snapshot name from the current (already sorted) list.
///
/// An empty list yields the fixed default `Snapshot1`. Otherwise the first
/// run of decimal digits found anywhere in the last entry's id is
/// incremented and appended to the prefix. An id with no digits, or a digit
/// run too large for `u64`, counts as 0 so the result is always well-formed.
pub fn next_snapshot_name(current: &[SnapshotInfo]) -> String {
    let index = match current.last() {
        Some(last) => first_digit_run(&last.id).unwrap_or(0),
        None => return format!("{SNAPSHOT_NAME_PREFIX}1"),
    };
    format!("{SNAPSHOT_NAME_PREFIX}{}", index.saturating_add(1))
}

fn first_digit_run(id: &str) -> Option<u64> {
    let start = id.find(|c: char| c.is_ascii_digit())?;
    let run: &str = &id[start..];
    let end = run
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(run.len());
    run[..end].parse().ok()
}
