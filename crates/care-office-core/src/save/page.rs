//! State of one open detail page.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::Config;
use crate::dirty::{DirtyKey, DirtyTracker};
use crate::models::{EntityType, FileUpload, Fields, Persisted, RecordId, Section, SectionRecord};
use crate::staging::{PendingChangeSet, SectionEditor, StagedCollection, StagingResult};
use crate::store::{RemoteStore, StoreError, StoreResult};

use super::{SaveOrchestrator, SaveReport, SaveRequest, SaveResult};

/// Who is editing what. Lives as long as the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub entity_type: EntityType,
    pub entity_id: RecordId,
    /// Display name shown in breadcrumbs and activity entries
    pub entity_name: String,
    /// Name recorded as the author of activity entries
    pub user_name: String,
}

impl PageContext {
    pub fn breadcrumb(&self) -> String {
        format!("{} / {}", self.entity_type.list_title(), self.entity_name)
    }
}

/// Form data, persisted snapshot and pending child changes of one detail page.
#[derive(Debug)]
pub struct DetailPage {
    context: PageContext,
    form: Fields,
    original: Fields,
    changes: PendingChangeSet,
    photo: Option<FileUpload>,
    refresh: BTreeMap<Section, u64>,
    field_errors: BTreeMap<String, String>,
    form_revision: u64,
    snapshot_revision: u64,
    tracker: DirtyTracker,
}

impl DetailPage {
    /// Page over an already loaded parent record.
    pub fn new(
        entity_type: EntityType,
        entity_id: RecordId,
        user_name: impl Into<String>,
        record: Fields,
    ) -> Self {
        let context = PageContext {
            entity_type,
            entity_name: entity_type.display_name(&record),
            entity_id,
            user_name: user_name.into(),
        };
        Self {
            context,
            form: record.clone(),
            original: record,
            changes: PendingChangeSet::new(),
            photo: None,
            refresh: BTreeMap::new(),
            field_errors: BTreeMap::new(),
            form_revision: 0,
            snapshot_revision: 0,
            tracker: DirtyTracker::new(),
        }
    }

    /// Load the parent record from the store and open a page over it.
    pub fn open<S: RemoteStore + ?Sized>(
        store: &S,
        entity_type: EntityType,
        entity_id: RecordId,
        user_name: impl Into<String>,
    ) -> StoreResult<Self> {
        let record = store
            .get(entity_type.table(), &entity_id)?
            .ok_or_else(|| StoreError::NotFound {
                table: entity_type.table(),
                id: entity_id.clone(),
            })?;
        Ok(Self::new(entity_type, entity_id, user_name, record))
    }

    pub fn context(&self) -> &PageContext {
        &self.context
    }

    pub fn breadcrumb(&self) -> String {
        self.context.breadcrumb()
    }

    pub fn form(&self) -> &Fields {
        &self.form
    }

    /// Last-known persisted parent record.
    pub fn original(&self) -> &Fields {
        &self.original
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.form.get(name)
    }

    /// Edit one parent field. Clears any inline error on it.
    pub fn set_field(&mut self, name: &str, value: Value) {
        self.field_errors.remove(name);
        self.form.insert(name.to_string(), value);
        self.form_revision += 1;
    }

    pub fn changes(&self) -> &PendingChangeSet {
        &self.changes
    }

    pub fn changes_mut(&mut self) -> &mut PendingChangeSet {
        &mut self.changes
    }

    pub fn slice_mut<T: SectionRecord>(&mut self) -> StagingResult<&mut StagedCollection<T>> {
        self.changes.slice_mut::<T>()
    }

    /// Editor for one section over its persisted rows.
    pub fn editor<'a, T: SectionRecord>(
        &'a mut self,
        persisted: &'a [Persisted<T>],
    ) -> StagingResult<SectionEditor<'a, T>> {
        Ok(SectionEditor::new(persisted, self.changes.slice_mut::<T>()?))
    }

    pub fn select_photo(&mut self, file: FileUpload) {
        self.photo = Some(file);
    }

    pub fn clear_photo(&mut self) {
        self.photo = None;
    }

    pub fn is_photo_dirty(&self) -> bool {
        self.photo.is_some()
    }

    /// Unsaved form edits, queued child changes or a selected photo.
    pub fn is_dirty(&self) -> bool {
        let key = DirtyKey {
            form_revision: self.form_revision,
            snapshot_revision: self.snapshot_revision,
            changes_revision: self.changes.revision(),
        };
        self.tracker
            .evaluate(key, &self.form, &self.original, &self.changes)
            || self.is_photo_dirty()
    }

    /// Whether leaving the page should ask the user first.
    pub fn requires_leave_confirmation(&self) -> bool {
        self.is_dirty()
    }

    /// How often the tracker actually re-ran the comparison.
    pub fn dirty_evaluations(&self) -> u64 {
        self.tracker.evaluations()
    }

    /// Drop every unsaved edit and go back to the persisted snapshot.
    pub fn discard_changes(&mut self) {
        self.form = self.original.clone();
        self.form_revision += 1;
        self.changes.clear();
        self.photo = None;
        self.field_errors.clear();
    }

    /// Bumped after each save that touched `section`; sections re-fetch on change.
    pub fn refresh_count(&self, section: Section) -> u64 {
        self.refresh.get(&section).copied().unwrap_or(0)
    }

    /// Inline error shown next to a form field.
    pub fn field_error(&self, name: &str) -> Option<&str> {
        self.field_errors.get(name).map(String::as_str)
    }

    /// Save everything pending. On failure the page is left as it was, apart
    /// from the inline error for a failed validation.
    pub fn save<S: RemoteStore + ?Sized>(
        &mut self,
        store: &S,
        config: &Config,
    ) -> SaveResult<SaveReport> {
        self.field_errors.clear();

        let request = SaveRequest {
            context: &self.context,
            current: &self.form,
            original: &self.original,
            changes: &self.changes,
            photo: self.photo.as_ref(),
        };

        match SaveOrchestrator::new(store, config).run(request) {
            Ok(report) => {
                self.original = report.saved.clone();
                self.form = report.saved.clone();
                self.form_revision += 1;
                self.snapshot_revision += 1;
                self.changes.clear();
                self.photo = None;
                for section in &report.touched {
                    *self.refresh.entry(*section).or_insert(0) += 1;
                }
                self.context.entity_name = self.context.entity_type.display_name(&self.original);
                Ok(report)
            }
            Err(err) => {
                if let Some(field) = err.field() {
                    self.field_errors.insert(field.to_string(), err.to_string());
                }
                Err(err)
            }
        }
    }
}
