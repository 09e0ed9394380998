//! Care Office Core Library
//!
//! Staging, dirty tracking and batch save for the detail pages of a
//! disability-support back office (staff, participants, shifts).
//!
//! # Architecture
//!
//! ```text
//!   Section editors (compliance, training, documents, ... contacts)
//!                 │  add / edit / delete / undo
//!                 ▼
//!   [STAGING: PendingChangeSet]  ◄── one StagedCollection<T> per section
//!                 │
//!        Dirty tracker ── form diff ── leave-page guard
//!                 │
//!           explicit Save
//!                 │
//!   ┌─────────────▼─────────────────────────────┐
//!   │  validate parent (required-when rules)    │
//!   │  drain slices in save order               │
//!   │  upload photo, patch parent, log activity │
//!   └─────────────┬─────────────────────────────┘
//!                 │
//!                 ▼
//!           RemoteStore (SQLite implementation)
//! ```
//!
//! # Core Principle
//!
//! **Nothing reaches the store until the user saves.** A failed save leaves
//! every pending change in place so it can be resubmitted.
//!
//! # Modules
//!
//! - [`models`]: Record types (ids, sections, parent entities, roster)
//! - [`staging`]: Staged collections, the page change set, section editors
//! - [`dirty`]: Field diff and the memoised dirty flag
//! - [`validation`]: Status-conditional required fields
//! - [`save`]: Detail page state and the batch save orchestrator
//! - [`store`]: Remote store capabilities and the SQLite store
//! - [`roster`]: Shift duration, calendar ranges, roster overlay
//! - [`config`]: Bucket names, validation rules, roster settings

pub mod config;
pub mod dirty;
pub mod models;
pub mod roster;
pub mod save;
pub mod staging;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use dirty::{is_dirty, DirtyTracker};
pub use models::{
    EntityType, Fields, FileUpload, Persisted, RecordId, RecordKey, Section, SectionRecord,
    TempId,
};
pub use save::{DetailPage, FriendlyError, SaveError, SaveOrchestrator, SaveReport};
pub use staging::{PendingChangeSet, SectionEditor, StagedCollection};
pub use store::{RemoteStore, SqliteStore};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use staging::DeleteMeta;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum CareOfficeError {
    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("{0}")]
    SaveFailed(String),

    #[error("No detail page is open")]
    NoOpenPage,
}

impl From<store::StoreError> for CareOfficeError {
    fn from(e: store::StoreError) -> Self {
        match e {
            store::StoreError::NotFound { .. } => CareOfficeError::NotFound(e.to_string()),
            other => CareOfficeError::StoreError(other.to_string()),
        }
    }
}

impl From<staging::StagingError> for CareOfficeError {
    fn from(e: staging::StagingError) -> Self {
        CareOfficeError::InvalidInput(e.to_string())
    }
}

impl From<save::SaveError> for CareOfficeError {
    fn from(e: save::SaveError) -> Self {
        let friendly = e.friendly();
        CareOfficeError::SaveFailed(format!("{}: {}", friendly.title, friendly.description))
    }
}

impl From<roster::RosterError> for CareOfficeError {
    fn from(e: roster::RosterError) -> Self {
        CareOfficeError::InvalidInput(e.to_string())
    }
}

impl From<config::ConfigError> for CareOfficeError {
    fn from(e: config::ConfigError) -> Self {
        CareOfficeError::InvalidInput(e.to_string())
    }
}

impl From<serde_json::Error> for CareOfficeError {
    fn from(e: serde_json::Error) -> Self {
        CareOfficeError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for CareOfficeError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        CareOfficeError::StoreError(format!("Lock poisoned: {}", e))
    }
}

fn parse_fields(json: &str) -> Result<Fields, CareOfficeError> {
    Ok(serde_json::from_str(json)?)
}

fn parse_section(section: &str) -> Result<Section, CareOfficeError> {
    section.parse().map_err(CareOfficeError::InvalidInput)
}

fn parse_entity_type(entity_type: &str) -> Result<EntityType, CareOfficeError> {
    entity_type.parse().map_err(CareOfficeError::InvalidInput)
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a store at the given path. `config_json` overrides the defaults.
#[uniffi::export]
pub fn open_care_office(
    path: String,
    config_json: Option<String>,
) -> Result<Arc<CareOfficeCore>, CareOfficeError> {
    let store = SqliteStore::open(&path)?;
    let config = match config_json {
        Some(json) => Config::from_json_str(&json)?,
        None => Config::default(),
    };
    Ok(Arc::new(CareOfficeCore::new(store, config)))
}

/// Create an in-memory store (for testing).
#[uniffi::export]
pub fn open_care_office_in_memory() -> Result<Arc<CareOfficeCore>, CareOfficeError> {
    let store = SqliteStore::open_in_memory()?;
    Ok(Arc::new(CareOfficeCore::new(store, Config::default())))
}

/// Shift length in hours. Without dates an end before the start wraps past midnight.
#[uniffi::export]
pub fn calculate_shift_duration(
    start_time: String,
    end_time: String,
    start_date: Option<String>,
    end_date: Option<String>,
) -> Result<f64, CareOfficeError> {
    Ok(roster::calculate_duration(
        &start_time,
        &end_time,
        start_date.as_deref(),
        end_date.as_deref(),
    )?)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe store and detail page wrapper for FFI.
#[derive(uniffi::Object)]
pub struct CareOfficeCore {
    store: Mutex<SqliteStore>,
    page: Mutex<Option<DetailPage>>,
    config: Config,
}

impl CareOfficeCore {
    fn new(store: SqliteStore, config: Config) -> Self {
        Self {
            store: Mutex::new(store),
            page: Mutex::new(None),
            config,
        }
    }

    fn with_page<R>(
        &self,
        f: impl FnOnce(&mut DetailPage) -> Result<R, CareOfficeError>,
    ) -> Result<R, CareOfficeError> {
        let mut page = self.page.lock()?;
        let page = page.as_mut().ok_or(CareOfficeError::NoOpenPage)?;
        f(page)
    }
}

#[uniffi::export]
impl CareOfficeCore {
    // =========================================================================
    // Record Operations
    // =========================================================================

    /// Insert a parent record (staff, participant, shift) and return its id.
    pub fn create_record(
        &self,
        entity_type: String,
        record_json: String,
    ) -> Result<String, CareOfficeError> {
        let entity_type = parse_entity_type(&entity_type)?;
        let record = parse_fields(&record_json)?;
        let store = self.store.lock()?;
        let stored = store.create(entity_type.table(), &record)?;
        stored
            .get("id")
            .and_then(|id| id.as_str())
            .map(str::to_string)
            .ok_or_else(|| CareOfficeError::StoreError("Store returned no id".to_string()))
    }

    /// Persisted records of one section for an entity, as a JSON array.
    pub fn list_section(
        &self,
        section: String,
        entity_type: String,
        entity_id: String,
    ) -> Result<String, CareOfficeError> {
        let section = parse_section(&section)?;
        let entity_type = parse_entity_type(&entity_type)?;
        let store = self.store.lock()?;
        let rows = store.query(
            section.table(),
            &[store::Filter::eq(entity_type.foreign_key(), entity_id)],
            None,
        )?;
        Ok(serde_json::to_string(&rows)?)
    }

    // =========================================================================
    // Page Operations
    // =========================================================================

    /// Load a parent record and make it the open detail page.
    pub fn open_page(
        &self,
        entity_type: String,
        entity_id: String,
        user_name: String,
    ) -> Result<FfiPageSummary, CareOfficeError> {
        let entity_type = parse_entity_type(&entity_type)?;
        let store = self.store.lock()?;
        let page = DetailPage::open(&*store, entity_type, RecordId::new(entity_id), user_name)?;
        let summary = FfiPageSummary::from_page(&page)?;
        *self.page.lock()? = Some(page);
        Ok(summary)
    }

    /// Drop the open page and everything staged on it.
    pub fn close_page(&self) -> Result<(), CareOfficeError> {
        *self.page.lock()? = None;
        Ok(())
    }

    pub fn page_summary(&self) -> Result<FfiPageSummary, CareOfficeError> {
        self.with_page(|page| FfiPageSummary::from_page(page))
    }

    /// Set one form field from a JSON value.
    pub fn set_field(&self, name: String, value_json: String) -> Result<(), CareOfficeError> {
        let value: serde_json::Value = serde_json::from_str(&value_json)?;
        self.with_page(|page| {
            page.set_field(&name, value);
            Ok(())
        })
    }

    pub fn select_photo(
        &self,
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<(), CareOfficeError> {
        self.with_page(|page| {
            page.select_photo(FileUpload::new(file_name, content_type, bytes));
            Ok(())
        })
    }

    pub fn is_dirty(&self) -> Result<bool, CareOfficeError> {
        self.with_page(|page| Ok(page.is_dirty()))
    }

    pub fn discard_changes(&self) -> Result<(), CareOfficeError> {
        self.with_page(|page| {
            page.discard_changes();
            Ok(())
        })
    }

    pub fn field_error(&self, name: String) -> Result<Option<String>, CareOfficeError> {
        self.with_page(|page| Ok(page.field_error(&name).map(str::to_string)))
    }

    pub fn refresh_count(&self, section: String) -> Result<u64, CareOfficeError> {
        let section = parse_section(&section)?;
        self.with_page(|page| Ok(page.refresh_count(section)))
    }

    // =========================================================================
    // Staging Operations
    // =========================================================================

    /// Stage a new record and return its temp id.
    pub fn add_draft(&self, section: String, record_json: String) -> Result<String, CareOfficeError> {
        let section = parse_section(&section)?;
        let record = parse_fields(&record_json)?;
        self.with_page(|page| {
            let temp_id = page.changes_mut().add_draft_fields(section, record)?;
            Ok(temp_id.to_string())
        })
    }

    /// Stage a new record with the file to upload before it is created.
    pub fn add_draft_with_upload(
        &self,
        section: String,
        record_json: String,
        file_name: String,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<String, CareOfficeError> {
        let section = parse_section(&section)?;
        let record = parse_fields(&record_json)?;
        let upload = FileUpload::new(file_name, content_type, bytes);
        self.with_page(|page| {
            let temp_id = page
                .changes_mut()
                .add_draft_fields_with_upload(section, record, upload)?;
            Ok(temp_id.to_string())
        })
    }

    /// Merge fields into a staged draft.
    pub fn patch_draft(
        &self,
        section: String,
        temp_id: String,
        patch_json: String,
    ) -> Result<(), CareOfficeError> {
        let section = parse_section(&section)?;
        let temp_id = TempId::parse(&temp_id)
            .ok_or_else(|| CareOfficeError::InvalidInput(format!("Not a temp id: {}", temp_id)))?;
        let patch = parse_fields(&patch_json)?;
        self.with_page(|page| Ok(page.changes_mut().patch_draft_fields(section, &temp_id, &patch)?))
    }

    pub fn remove_draft(&self, section: String, temp_id: String) -> Result<bool, CareOfficeError> {
        let section = parse_section(&section)?;
        let Some(temp_id) = TempId::parse(&temp_id) else {
            return Ok(false);
        };
        self.with_page(|page| Ok(page.changes_mut().remove_draft(section, &temp_id)?))
    }

    /// Queue a partial update of a persisted record, or merge it into a draft.
    /// Returns false when the record is pending delete.
    pub fn queue_update(
        &self,
        section: String,
        id: String,
        patch_json: String,
    ) -> Result<bool, CareOfficeError> {
        let section = parse_section(&section)?;
        let patch = parse_fields(&patch_json)?;
        self.with_page(|page| match RecordKey::parse(&id) {
            RecordKey::Draft(temp_id) => {
                page.changes_mut()
                    .patch_draft_fields(section, &temp_id, &patch)?;
                Ok(true)
            }
            RecordKey::Persisted(id) => Ok(page.changes_mut().queue_update(section, id, patch)?),
        })
    }

    pub fn cancel_update(&self, section: String, id: String) -> Result<bool, CareOfficeError> {
        let section = parse_section(&section)?;
        self.with_page(|page| {
            Ok(page
                .changes_mut()
                .cancel_update(section, &RecordId::new(id))?)
        })
    }

    /// Delete a draft or queue a persisted record for deletion.
    pub fn queue_delete(
        &self,
        section: String,
        key: String,
        meta: FfiDeleteMeta,
    ) -> Result<(), CareOfficeError> {
        let section = parse_section(&section)?;
        let key = RecordKey::parse(&key);
        self.with_page(|page| {
            page.changes_mut()
                .queue_delete(section, key, meta.into())?;
            Ok(())
        })
    }

    pub fn cancel_delete(&self, section: String, id: String) -> Result<bool, CareOfficeError> {
        let section = parse_section(&section)?;
        self.with_page(|page| {
            Ok(page
                .changes_mut()
                .cancel_delete(section, &RecordId::new(id))?)
        })
    }

    /// Sections with queued changes, in save order.
    pub fn pending_sections(&self) -> Result<Vec<String>, CareOfficeError> {
        self.with_page(|page| {
            Ok(page
                .changes()
                .dirty_sections()
                .into_iter()
                .map(|s| s.as_str().to_string())
                .collect())
        })
    }

    // =========================================================================
    // Save
    // =========================================================================

    /// Save everything pending on the open page.
    pub fn save(&self) -> Result<FfiSaveReport, CareOfficeError> {
        let store = self.store.lock()?;
        self.with_page(|page| {
            let report = page.save(&*store, &self.config)?;
            Ok(report.into())
        })
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe summary of the open page.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPageSummary {
    pub entity_type: String,
    pub entity_id: String,
    pub entity_name: String,
    pub breadcrumb: String,
    /// Current form data as a JSON object
    pub form_json: String,
}

impl FfiPageSummary {
    fn from_page(page: &DetailPage) -> Result<Self, CareOfficeError> {
        let context = page.context();
        Ok(Self {
            entity_type: context.entity_type.as_str().to_string(),
            entity_id: context.entity_id.to_string(),
            entity_name: context.entity_name.clone(),
            breadcrumb: page.breadcrumb(),
            form_json: serde_json::to_string(page.form())?,
        })
    }
}

/// FFI-safe delete metadata.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiDeleteMeta {
    pub label: Option<String>,
    /// Stored file path to remove before the record
    pub file_path: Option<String>,
    pub file_name: Option<String>,
}

impl From<FfiDeleteMeta> for DeleteMeta {
    fn from(meta: FfiDeleteMeta) -> Self {
        let file = meta.file_path.map(|path| models::StoredFile {
            name: meta
                .file_name
                .unwrap_or_else(|| path.rsplit('/').next().unwrap_or(&path).to_string()),
            path,
        });
        DeleteMeta {
            label: meta.label,
            file,
        }
    }
}

/// FFI-safe draft-to-record id mapping.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCreatedRecord {
    pub temp_id: String,
    pub id: String,
}

/// FFI-safe save outcome.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSaveReport {
    pub mutations: u32,
    pub touched_sections: Vec<String>,
    pub parent_fields: Vec<String>,
    pub created: Vec<FfiCreatedRecord>,
}

impl From<SaveReport> for FfiSaveReport {
    fn from(report: SaveReport) -> Self {
        Self {
            mutations: report.mutations as u32,
            touched_sections: report
                .touched
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            parent_fields: report.parent_patch.keys().cloned().collect(),
            created: report
                .created
                .into_iter()
                .map(|(temp_id, id)| FfiCreatedRecord {
                    temp_id: temp_id.to_string(),
                    id: id.to_string(),
                })
                .collect(),
        }
    }
}
