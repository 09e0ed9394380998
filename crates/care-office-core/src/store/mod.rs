//! Remote data and file storage.
//!
//! The save path only needs the narrow capabilities in [`RemoteStore`]:
//! generic CRUD over named tables and blob storage by bucket and path.
//! [`SqliteStore`] implements them over a local SQLite file.

mod schema;
mod sqlite;

pub use schema::*;
pub use sqlite::*;

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::models::{
    EntityType, FileUpload, Fields, Persisted, RecordId, SectionRecord, Table,
};

/// Error reported by the remote store itself, with its error code when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    /// Store error code (e.g., "23505" for a unique violation)
    pub code: Option<String>,
    pub message: String,
    pub details: Option<String>,
}

impl RemoteError {
    pub fn new(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code: code.map(str::to_string),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.message, code),
            None => f.write_str(&self.message),
        }
    }
}

/// Storage errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Remote error: {0}")]
    Remote(RemoteError),

    #[error("Record not found: {table}/{id}")]
    NotFound { table: Table, id: RecordId },

    #[error("File not found: {bucket}/{path}")]
    FileNotFound { bucket: String, path: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

/// Condition on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn gte(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Gte,
            value: value.into(),
        }
    }

    pub fn lte(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Lte,
            value: value.into(),
        }
    }
}

/// Sort order for queries; insertion order breaks ties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub ascending: bool,
}

impl Order {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            ascending: true,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            ascending: false,
        }
    }
}

/// Capabilities the core needs from the data and file store.
pub trait RemoteStore {
    /// Insert a record and return it as stored, including its assigned `id`.
    fn create(&self, table: Table, record: &Fields) -> StoreResult<Fields>;

    /// Apply a partial update.
    fn update(&self, table: Table, id: &RecordId, patch: &Fields) -> StoreResult<()>;

    fn delete(&self, table: Table, id: &RecordId) -> StoreResult<()>;

    fn query(
        &self,
        table: Table,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> StoreResult<Vec<Fields>>;

    fn get(&self, table: Table, id: &RecordId) -> StoreResult<Option<Fields>> {
        Ok(self
            .query(table, &[Filter::eq("id", id.as_str())], None)?
            .into_iter()
            .next())
    }

    fn upload_file(&self, bucket: &str, path: &str, file: &FileUpload) -> StoreResult<()>;

    fn download_file(&self, bucket: &str, path: &str) -> StoreResult<Vec<u8>>;

    fn remove_file(&self, bucket: &str, path: &str) -> StoreResult<()>;

    fn public_url(&self, bucket: &str, path: &str) -> String;
}

impl<S: RemoteStore + ?Sized> RemoteStore for &S {
    fn create(&self, table: Table, record: &Fields) -> StoreResult<Fields> {
        (**self).create(table, record)
    }

    fn update(&self, table: Table, id: &RecordId, patch: &Fields) -> StoreResult<()> {
        (**self).update(table, id, patch)
    }

    fn delete(&self, table: Table, id: &RecordId) -> StoreResult<()> {
        (**self).delete(table, id)
    }

    fn query(
        &self,
        table: Table,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> StoreResult<Vec<Fields>> {
        (**self).query(table, filters, order)
    }

    fn get(&self, table: Table, id: &RecordId) -> StoreResult<Option<Fields>> {
        (**self).get(table, id)
    }

    fn upload_file(&self, bucket: &str, path: &str, file: &FileUpload) -> StoreResult<()> {
        (**self).upload_file(bucket, path, file)
    }

    fn download_file(&self, bucket: &str, path: &str) -> StoreResult<Vec<u8>> {
        (**self).download_file(bucket, path)
    }

    fn remove_file(&self, bucket: &str, path: &str) -> StoreResult<()> {
        (**self).remove_file(bucket, path)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        (**self).public_url(bucket, path)
    }
}

/// Fetch the persisted records of one section for an owning entity.
pub fn load_section<T: SectionRecord, S: RemoteStore + ?Sized>(
    store: &S,
    owner: EntityType,
    owner_id: &RecordId,
) -> StoreResult<Vec<Persisted<T>>> {
    let rows = store.query(
        T::SECTION.table(),
        &[Filter::eq(owner.foreign_key(), owner_id.as_str())],
        None,
    )?;
    rows.into_iter()
        .map(|row| Ok(serde_json::from_value(Value::Object(row))?))
        .collect()
}
