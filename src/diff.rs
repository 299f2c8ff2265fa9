//! Snapshot comparison.
//!
//! Walks the current snapshot in fetch order and classifies each endpoint as
//! unchanged, transitioned or newly appeared relative to the previous one.
//! Endpoints that vanished from the current snapshot are not reported.

use chrono::{DateTime, Utc};

use crate::models::{ChangeEntry, ChangeSet, Snapshot};

/// Diff `current` against `previous`, stamping entries with the current time.
///
/// A missing `previous` means nothing has been observed yet, so the result is
/// always empty.
pub fn compare(previous: Option<&Snapshot>, current: &Snapshot) -> ChangeSet {
    compare_at(previous, current, Utc::now())
}

pub fn compare_at(
    previous: Option<&Snapshot>,
    current: &Snapshot,
    observed_at: DateTime<Utc>,
) -> ChangeSet {
    let mut changes = ChangeSet::default();
    let Some(previous) = previous else {
        return changes;
    };

    for record in current.iter() {
        let previous_status = match previous.status_of(&record.name) {
            None => None,
            Some(old) if old.as_str() != record.status.as_str() => Some(old.clone()),
            Some(_) => continue,
        };

        changes.push(ChangeEntry {
            name: record.name.clone(),
            is_new: previous_status.is_none(),
            previous_status,
            current_status: record.status.clone(),
            last_start: record.last_start.clone(),
            last_close: record.last_close.clone(),
            observed_at,
        });
    }

    changes
}
