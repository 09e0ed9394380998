//! Visible list composition for a section.

use super::{Draft, StagedCollection};
use crate::models::{Fields, Persisted, RecordKey, SectionRecord};

/// Pending state of a persisted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowState {
    Saved,
    PendingUpdate,
    /// Still shown, struck through, until save or undo
    PendingDelete,
}

/// One row of a section list.
#[derive(Debug, Clone, PartialEq)]
pub enum Row<'a, T> {
    Persisted {
        record: &'a Persisted<T>,
        state: RowState,
        /// Queued patch, when `state` is `PendingUpdate`
        patch: Option<&'a Fields>,
    },
    Draft(&'a Draft<T>),
}

impl<T> Row<'_, T> {
    pub fn key(&self) -> RecordKey {
        match self {
            Row::Persisted { record, .. } => RecordKey::Persisted(record.id.clone()),
            Row::Draft(draft) => RecordKey::Draft(draft.temp_id.clone()),
        }
    }

    pub fn data(&self) -> &T {
        match self {
            Row::Persisted { record, .. } => &record.data,
            Row::Draft(draft) => &draft.data,
        }
    }

    pub fn is_pending_delete(&self) -> bool {
        matches!(
            self,
            Row::Persisted {
                state: RowState::PendingDelete,
                ..
            }
        )
    }
}

/// Rows in display order: persisted records in their fetched order, then drafts.
///
/// Updated and deleted records keep their position and only change state.
pub fn compose_rows<'a, T: SectionRecord>(
    persisted: &'a [Persisted<T>],
    slice: &'a StagedCollection<T>,
) -> Vec<Row<'a, T>> {
    let saved = persisted.iter().map(|record| {
        if slice.is_pending_delete(&record.id) {
            Row::Persisted {
                record,
                state: RowState::PendingDelete,
                patch: None,
            }
        } else if let Some(patch) = slice.pending_update(&record.id) {
            Row::Persisted {
                record,
                state: RowState::PendingUpdate,
                patch: Some(patch),
            }
        } else {
            Row::Persisted {
                record,
                state: RowState::Saved,
                patch: None,
            }
        }
    });
    let drafts = slice.to_add().iter().map(Row::Draft);
    saved.chain(drafts).collect()
}
