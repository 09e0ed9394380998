//! Section editors: record-aware operations over one staged slice.

use super::{compose_rows, DeleteMeta, Row, StagedCollection, StagingError, StagingResult};
use crate::dirty::{apply_patch, diff_fields};
use crate::models::{FileUpload, Fields, Persisted, RecordId, RecordKey, SectionRecord, TempId};

/// Pairs the persisted records of a section with its pending changes.
pub struct SectionEditor<'a, T> {
    persisted: &'a [Persisted<T>],
    slice: &'a mut StagedCollection<T>,
}

fn to_fields<T: SectionRecord>(data: &T) -> StagingResult<Fields> {
    match serde_json::to_value(data)? {
        serde_json::Value::Object(map) => Ok(map),
        _ => Err(StagingError::NotAnObject(T::SECTION)),
    }
}

impl<'a, T: SectionRecord> SectionEditor<'a, T> {
    pub fn new(persisted: &'a [Persisted<T>], slice: &'a mut StagedCollection<T>) -> Self {
        Self { persisted, slice }
    }

    fn find(&self, id: &RecordId) -> StagingResult<&'a Persisted<T>> {
        self.persisted
            .iter()
            .find(|r| &r.id == id)
            .ok_or_else(|| StagingError::UnknownRecord(id.clone()))
    }

    pub fn rows(&self) -> Vec<Row<'_, T>> {
        compose_rows(self.persisted, self.slice)
    }

    pub fn add(&mut self, data: T) -> TempId {
        self.slice.add_draft(data)
    }

    pub fn add_with_upload(&mut self, data: T, upload: FileUpload) -> TempId {
        self.slice.add_draft_with_upload(data, upload)
    }

    /// Stage an edited copy of a persisted record.
    ///
    /// Only the fields that differ from the persisted version are queued. An
    /// edit that matches the persisted record cancels any pending update.
    /// Returns whether an update is now pending.
    pub fn stage_edit(&mut self, id: &RecordId, edited: &T) -> StagingResult<bool> {
        let record = self.find(id)?;
        let patch = diff_fields(&to_fields(edited)?, &to_fields(&record.data)?);
        if patch.is_empty() {
            self.slice.cancel_update(id);
            return Ok(false);
        }
        Ok(self.slice.queue_update(id.clone(), patch))
    }

    /// Stage removal of a row; drafts are discarded outright.
    pub fn stage_delete(&mut self, key: &RecordKey) -> StagingResult<()> {
        match key {
            RecordKey::Draft(temp_id) => {
                if !self.slice.remove_draft(temp_id) {
                    return Err(StagingError::UnknownDraft(temp_id.clone()));
                }
            }
            RecordKey::Persisted(id) => {
                let record = self.find(id)?;
                let meta = DeleteMeta {
                    label: Some(record.data.label()),
                    file: record.data.stored_file(),
                };
                self.slice.queue_delete(key.clone(), meta);
            }
        }
        Ok(())
    }

    /// Undo a pending update or delete. Returns false if nothing was pending.
    pub fn undo(&mut self, id: &RecordId) -> bool {
        self.slice.cancel_update(id) || self.slice.cancel_delete(id)
    }

    /// The record as it will look after save, or `None` if it is being deleted.
    pub fn effective(&self, id: &RecordId) -> StagingResult<Option<T>> {
        let record = self.find(id)?;
        if self.slice.is_pending_delete(id) {
            return Ok(None);
        }
        match self.slice.pending_update(id) {
            None => Ok(Some(record.data.clone())),
            Some(patch) => {
                let mut fields = to_fields(&record.data)?;
                apply_patch(&mut fields, patch);
                Ok(Some(serde_json::from_value(serde_json::Value::Object(
                    fields,
                ))?))
            }
        }
    }

    /// Every record that will exist after save, in display order.
    pub fn effective_records(&self) -> StagingResult<Vec<T>> {
        let mut records = Vec::new();
        for record in self.persisted {
            if let Some(data) = self.effective(&record.id)? {
                records.push(data);
            }
        }
        records.extend(self.slice.to_add().iter().map(|d| d.data.clone()));
        Ok(records)
    }
}
