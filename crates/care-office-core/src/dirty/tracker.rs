//! Dirty tracking for a detail page.

use std::cell::Cell;

use super::values_equal;
use crate::models::Fields;
use crate::staging::PendingChangeSet;

/// Whether unsaved differences exist.
///
/// Dirty when any form field differs from the snapshot (blank values are
/// equivalent) or when any section has queued changes.
pub fn is_dirty(current: &Fields, original: &Fields, changes: &PendingChangeSet) -> bool {
    form_differs(current, original) || !changes.is_empty()
}

/// Field-level comparison only, ignoring staged sections.
pub fn form_differs(current: &Fields, original: &Fields) -> bool {
    current
        .iter()
        .any(|(key, value)| !values_equal(Some(value), original.get(key)))
}

/// Revisions of the three inputs to [`is_dirty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyKey {
    pub form_revision: u64,
    pub snapshot_revision: u64,
    pub changes_revision: u64,
}

/// Memoises [`is_dirty`] on the revisions of its inputs.
#[derive(Debug, Default)]
pub struct DirtyTracker {
    cached: Cell<Option<(DirtyKey, bool)>>,
    evaluations: Cell<u64>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached answer for `key`, recomputing only when a revision moved.
    pub fn evaluate(
        &self,
        key: DirtyKey,
        current: &Fields,
        original: &Fields,
        changes: &PendingChangeSet,
    ) -> bool {
        if let Some((cached_key, dirty)) = self.cached.get() {
            if cached_key == key {
                return dirty;
            }
        }
        let dirty = is_dirty(current, original, changes);
        self.evaluations.set(self.evaluations.get() + 1);
        self.cached.set(Some((key, dirty)));
        dirty
    }

    /// How many times the comparison actually ran.
    pub fn evaluations(&self) -> u64 {
        self.evaluations.get()
    }

    pub fn invalidate(&self) {
        self.cached.set(None);
    }
}
