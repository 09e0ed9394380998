//! Client-side staging of child record mutations.
//!
//! Section editors never talk to the store. They write adds, updates and
//! deletes into a [`StagedCollection`] slice of the page's
//! [`PendingChangeSet`]; the batch save drains every slice in one pass.

mod change_set;
mod collection;
mod editor;
mod rows;

pub use change_set::*;
pub use collection::*;
pub use editor::*;
pub use rows::*;

use thiserror::Error;

use crate::models::{RecordId, Section, TempId};

/// Staging errors.
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("Unknown draft: {0}")]
    UnknownDraft(TempId),

    #[error("Unknown record: {0}")]
    UnknownRecord(RecordId),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} records must serialize to a JSON object")]
    NotAnObject(Section),

    #[error("Slice for {0} holds a different record type")]
    SliceTypeMismatch(Section),
}

pub type StagingResult<T> = Result<T, StagingError>;
