//! The page-wide pending change set: one staged slice per section.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use super::{DeleteMeta, StagedCollection, StagingError, StagingResult};
use crate::models::{
    ComplianceRecord, Contact, Document, FileUpload, Fields, FundingRecord, Goal, Medication,
    RecordId, RecordKey, Section, SectionRecord, ServiceProvider, ShiftNote, StoredFile, TempId,
    TrainingRecord,
};

/// A file upload scheduled ahead of a create.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpload {
    /// Where the file will land inside the section's bucket
    pub file: StoredFile,
    pub upload: FileUpload,
}

/// One remote call the batch save will make.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedOp {
    Create {
        temp_id: TempId,
        record: Fields,
        upload: Option<PlannedUpload>,
    },
    Update {
        id: RecordId,
        patch: Fields,
    },
    Delete {
        id: RecordId,
        file: Option<StoredFile>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMutation {
    pub section: Section,
    /// Display name of the affected record
    pub label: String,
    pub op: PlannedOp,
}

/// Type-erased view of a [`StagedCollection`] used to walk all sections uniformly.
trait ErasedSlice: fmt::Debug + Send {
    fn is_empty(&self) -> bool;
    fn revision(&self) -> u64;
    fn plan(&self, entity_id: &RecordId) -> StagingResult<Vec<PlannedMutation>>;
    fn clear(&mut self);
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

fn label_from_patch<T: SectionRecord>(id: &RecordId, patch: &Fields) -> String {
    patch
        .get(T::LABEL_FIELD)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| id.to_string())
}

impl<T: SectionRecord> ErasedSlice for StagedCollection<T> {
    fn is_empty(&self) -> bool {
        StagedCollection::is_empty(self)
    }

    fn revision(&self) -> u64 {
        StagedCollection::revision(self)
    }

    fn plan(&self, entity_id: &RecordId) -> StagingResult<Vec<PlannedMutation>> {
        let mut planned = Vec::with_capacity(self.len());

        for draft in self.to_add() {
            let mut data = draft.data.clone();
            let upload = draft.upload.as_ref().map(|upload| {
                let file = StoredFile {
                    path: format!("{}/{}-{}", entity_id, draft.temp_id, upload.file_name),
                    name: upload.file_name.clone(),
                };
                data.attach_file(&file);
                PlannedUpload {
                    file,
                    upload: upload.clone(),
                }
            });
            let record = match serde_json::to_value(&data)? {
                serde_json::Value::Object(map) => map,
                _ => return Err(StagingError::NotAnObject(T::SECTION)),
            };
            planned.push(PlannedMutation {
                section: T::SECTION,
                label: data.label(),
                op: PlannedOp::Create {
                    temp_id: draft.temp_id.clone(),
                    record,
                    upload,
                },
            });
        }

        for update in self.to_update() {
            planned.push(PlannedMutation {
                section: T::SECTION,
                label: label_from_patch::<T>(&update.id, &update.patch),
                op: PlannedOp::Update {
                    id: update.id.clone(),
                    patch: update.patch.clone(),
                },
            });
        }

        for delete in self.to_delete() {
            planned.push(PlannedMutation {
                section: T::SECTION,
                label: delete
                    .meta
                    .label
                    .clone()
                    .unwrap_or_else(|| delete.id.to_string()),
                op: PlannedOp::Delete {
                    id: delete.id.clone(),
                    file: delete.meta.file.clone(),
                },
            });
        }

        Ok(planned)
    }

    fn clear(&mut self) {
        StagedCollection::clear(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Runs `$body` with `$ty` bound to the record type of `$section`.
macro_rules! with_section_type {
    ($section:expr, $ty:ident => $body:expr) => {
        match $section {
            Section::Compliance => {
                type $ty = ComplianceRecord;
                $body
            }
            Section::Training => {
                type $ty = TrainingRecord;
                $body
            }
            Section::Documents => {
                type $ty = Document;
                $body
            }
            Section::Medications => {
                type $ty = Medication;
                $body
            }
            Section::ServiceProviders => {
                type $ty = ServiceProvider;
                $body
            }
            Section::ShiftNotes => {
                type $ty = ShiftNote;
                $body
            }
            Section::Goals => {
                type $ty = Goal;
                $body
            }
            Section::Funding => {
                type $ty = FundingRecord;
                $body
            }
            Section::Contacts => {
                type $ty = Contact;
                $body
            }
        }
    };
}

/// Every staged slice of one detail page, iterated in batch-save order.
#[derive(Default)]
pub struct PendingChangeSet {
    slices: BTreeMap<Section, Box<dyn ErasedSlice>>,
    /// Bumped when a slice is created so revisions never repeat
    structure_revision: u64,
}

impl fmt::Debug for PendingChangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.slices.iter()).finish()
    }
}

impl PendingChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to a section's slice, if it was ever touched.
    pub fn slice<T: SectionRecord>(&self) -> Option<&StagedCollection<T>> {
        self.slices
            .get(&T::SECTION)
            .and_then(|slice| slice.as_any().downcast_ref::<StagedCollection<T>>())
    }

    /// Write access to a section's slice, creating it empty on first use.
    pub fn slice_mut<T: SectionRecord>(&mut self) -> StagingResult<&mut StagedCollection<T>> {
        if !self.slices.contains_key(&T::SECTION) {
            self.structure_revision += 1;
        }
        self.slices
            .entry(T::SECTION)
            .or_insert_with(|| Box::new(StagedCollection::<T>::new()))
            .as_any_mut()
            .downcast_mut::<StagedCollection<T>>()
            .ok_or(StagingError::SliceTypeMismatch(T::SECTION))
    }

    /// True when no section has anything queued.
    pub fn is_empty(&self) -> bool {
        self.slices.values().all(|slice| slice.is_empty())
    }

    /// Monotonic counter that changes whenever any slice changes.
    pub fn revision(&self) -> u64 {
        self.structure_revision + self.slices.values().map(|s| s.revision()).sum::<u64>()
    }

    /// Sections with queued changes, in save order.
    pub fn dirty_sections(&self) -> Vec<Section> {
        self.slices
            .iter()
            .filter(|(_, slice)| !slice.is_empty())
            .map(|(section, _)| *section)
            .collect()
    }

    /// Every queued mutation in save order: section by section, adds then updates then deletes.
    pub fn plan(&self, entity_id: &RecordId) -> StagingResult<Vec<PlannedMutation>> {
        let mut planned = Vec::new();
        for slice in self.slices.values() {
            planned.extend(slice.plan(entity_id)?);
        }
        Ok(planned)
    }

    /// Reset every slice to empty.
    pub fn clear(&mut self) {
        for slice in self.slices.values_mut() {
            slice.clear();
        }
    }

    // ---------------------------------------------------------------------
    // Section-keyed operations on loosely typed records (host UI bridge)
    // ---------------------------------------------------------------------

    pub fn add_draft_fields(&mut self, section: Section, record: Fields) -> StagingResult<TempId> {
        with_section_type!(section, R => {
            let data: R = serde_json::from_value(serde_json::Value::Object(record))?;
            Ok(self.slice_mut::<R>()?.add_draft(data))
        })
    }

    /// Stage a new record together with the file it describes.
    pub fn add_draft_fields_with_upload(
        &mut self,
        section: Section,
        record: Fields,
        upload: FileUpload,
    ) -> StagingResult<TempId> {
        with_section_type!(section, R => {
            let data: R = serde_json::from_value(serde_json::Value::Object(record))?;
            Ok(self.slice_mut::<R>()?.add_draft_with_upload(data, upload))
        })
    }

    pub fn patch_draft_fields(
        &mut self,
        section: Section,
        temp_id: &TempId,
        patch: &Fields,
    ) -> StagingResult<()> {
        with_section_type!(section, R => self.slice_mut::<R>()?.patch_draft(temp_id, patch))
    }

    pub fn remove_draft(&mut self, section: Section, temp_id: &TempId) -> StagingResult<bool> {
        with_section_type!(section, R => Ok(self.slice_mut::<R>()?.remove_draft(temp_id)))
    }

    pub fn queue_update(
        &mut self,
        section: Section,
        id: RecordId,
        patch: Fields,
    ) -> StagingResult<bool> {
        with_section_type!(section, R => Ok(self.slice_mut::<R>()?.queue_update(id, patch)))
    }

    pub fn cancel_update(&mut self, section: Section, id: &RecordId) -> StagingResult<bool> {
        with_section_type!(section, R => Ok(self.slice_mut::<R>()?.cancel_update(id)))
    }

    pub fn queue_delete(
        &mut self,
        section: Section,
        key: RecordKey,
        meta: DeleteMeta,
    ) -> StagingResult<()> {
        with_section_type!(section, R => {
            self.slice_mut::<R>()?.queue_delete(key, meta);
            Ok(())
        })
    }

    pub fn cancel_delete(&mut self, section: Section, id: &RecordId) -> StagingResult<bool> {
        with_section_type!(section, R => Ok(self.slice_mut::<R>()?.cancel_delete(id)))
    }
}
