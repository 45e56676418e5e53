//! Reconciliation of the local mirror against the remote calendar source.
//!
//! Calendars are soft-deleted: a calendar the remote stops reporting is
//! deactivated and kept. Events are hard-deleted: each active calendar's
//! events are replaced by the latest remote snapshot for the refresh window.

pub mod calendars;
pub mod events;

pub use calendars::reconcile_calendars;
pub use events::reconcile_events;

use std::collections::HashSet;

/// Remote ids in first-seen order, duplicates dropped.
pub(crate) fn remote_ids<'a, I>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}
