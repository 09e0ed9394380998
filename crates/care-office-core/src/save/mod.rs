//! Batch save of a detail page.
//!
//! Order of a save pass:
//! 1. diff the parent form against the snapshot and validate the result;
//! 2. drain every section slice in save order (adds, updates, deletes);
//! 3. upload a newly selected profile photo;
//! 4. patch the parent record with the changed fields;
//! 5. log one activity entry summarising the parent changes.
//!
//! The first failing remote call aborts the pass. Nothing is rolled back and
//! the pending buffer is left untouched so the same changes can be resubmitted.

mod activity;
mod friendly;
mod orchestrator;
mod page;

pub use activity::*;
pub use friendly::*;
pub use orchestrator::*;
pub use page::*;

use thiserror::Error;

use crate::models::Section;
use crate::staging::StagingError;
use crate::store::StoreError;
use crate::validation::ValidationError;

/// Save errors.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Could not prepare pending changes: {0}")]
    Staging(#[from] StagingError),

    #[error("Failed to {action} {} \"{label}\": {source}", .section.noun())]
    Mutation {
        section: Section,
        action: &'static str,
        label: String,
        #[source]
        source: StoreError,
    },

    #[error("File storage failed for {bucket}/{path}: {source}")]
    Storage {
        bucket: String,
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to update record: {0}")]
    Parent(#[source] StoreError),
}

pub type SaveResult<T> = Result<T, SaveError>;

impl SaveError {
    /// Form field to mark invalid, for validation failures.
    pub fn field(&self) -> Option<&str> {
        match self {
            SaveError::Validation(err) => Some(err.field()),
            _ => None,
        }
    }

    /// Title and body of the single toast shown for this failure.
    pub fn friendly(&self) -> FriendlyError {
        match self {
            SaveError::Validation(err) => FriendlyError::new("Missing required field", err.to_string()),
            SaveError::Staging(err) => FriendlyError::new("Could not save changes", err.to_string()),
            SaveError::Mutation { source, .. } | SaveError::Parent(source) => {
                parse_store_error(source)
            }
            SaveError::Storage { path, source, .. } => {
                let name = path.rsplit('/').next().unwrap_or(path);
                FriendlyError::new(
                    "File storage error",
                    format!("Could not store \"{}\": {}", name, source),
                )
            }
        }
    }
}
