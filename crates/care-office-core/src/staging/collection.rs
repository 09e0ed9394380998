//! Generic staged collection: the pending adds, updates and deletes of one section.

use serde::{Deserialize, Serialize};

use super::{StagingError, StagingResult};
use crate::dirty::apply_patch;
use crate::models::{
    FileUpload, Fields, RecordId, RecordKey, SectionRecord, StoredFile, TempId,
};

/// A locally created record that has not been saved yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft<T> {
    pub temp_id: TempId,
    pub data: T,
    /// File to upload before the record is created
    pub upload: Option<FileUpload>,
}

/// Changed fields queued against a persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingUpdate {
    pub id: RecordId,
    pub patch: Fields,
}

/// Extra context kept with a delete so cleanup and logging can run without a refetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteMeta {
    pub label: Option<String>,
    /// Stored file to remove before the record
    pub file: Option<StoredFile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingDelete {
    pub id: RecordId,
    pub meta: DeleteMeta,
}

/// Pending changes for one section.
///
/// Invariants:
/// - at most one pending update per id;
/// - an id is never both pending update and pending delete;
/// - a removed draft is gone for good.
///
/// Every mutation bumps [`revision`](Self::revision) so owners can memoise
/// derived state on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedCollection<T> {
    to_add: Vec<Draft<T>>,
    to_update: Vec<PendingUpdate>,
    to_delete: Vec<PendingDelete>,
    #[serde(skip)]
    revision: u64,
}

impl<T> Default for StagedCollection<T> {
    fn default() -> Self {
        Self {
            to_add: Vec::new(),
            to_update: Vec::new(),
            to_delete: Vec::new(),
            revision: 0,
        }
    }
}

impl<T: SectionRecord> StagedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_add(&self) -> &[Draft<T>] {
        &self.to_add
    }

    pub fn to_update(&self) -> &[PendingUpdate] {
        &self.to_update
    }

    pub fn to_delete(&self) -> &[PendingDelete] {
        &self.to_delete
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    /// Total number of queued mutations.
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_update.len() + self.to_delete.len()
    }

    pub fn draft(&self, temp_id: &TempId) -> Option<&Draft<T>> {
        self.to_add.iter().find(|d| &d.temp_id == temp_id)
    }

    pub fn pending_update(&self, id: &RecordId) -> Option<&Fields> {
        self.to_update
            .iter()
            .find(|u| &u.id == id)
            .map(|u| &u.patch)
    }

    pub fn is_pending_delete(&self, id: &RecordId) -> bool {
        self.to_delete.iter().any(|d| &d.id == id)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Stage a new record and return its temp id.
    pub fn add_draft(&mut self, data: T) -> TempId {
        self.push_draft(data, None)
    }

    /// Stage a new record together with the file it describes.
    pub fn add_draft_with_upload(&mut self, data: T, upload: FileUpload) -> TempId {
        self.push_draft(data, Some(upload))
    }

    fn push_draft(&mut self, data: T, upload: Option<FileUpload>) -> TempId {
        let temp_id = TempId::generate();
        self.to_add.push(Draft {
            temp_id: temp_id.clone(),
            data,
            upload,
        });
        self.touch();
        temp_id
    }

    /// Replace the body of a draft.
    pub fn edit_draft(&mut self, temp_id: &TempId, data: T) -> StagingResult<()> {
        let draft = self
            .to_add
            .iter_mut()
            .find(|d| &d.temp_id == temp_id)
            .ok_or_else(|| StagingError::UnknownDraft(temp_id.clone()))?;
        draft.data = data;
        self.touch();
        Ok(())
    }

    /// Merge loosely typed fields into a draft.
    pub fn patch_draft(&mut self, temp_id: &TempId, patch: &Fields) -> StagingResult<()> {
        let draft = self
            .draft(temp_id)
            .ok_or_else(|| StagingError::UnknownDraft(temp_id.clone()))?;
        let mut fields = match serde_json::to_value(&draft.data)? {
            serde_json::Value::Object(map) => map,
            _ => return Err(StagingError::NotAnObject(T::SECTION)),
        };
        apply_patch(&mut fields, patch);
        let data: T = serde_json::from_value(serde_json::Value::Object(fields))?;
        self.edit_draft(temp_id, data)
    }

    /// Discard a draft. Returns false if it did not exist.
    pub fn remove_draft(&mut self, temp_id: &TempId) -> bool {
        let before = self.to_add.len();
        self.to_add.retain(|d| &d.temp_id != temp_id);
        let removed = self.to_add.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Queue changed fields for a persisted record, replacing any earlier patch.
    ///
    /// Returns false without queuing when the record is pending deletion.
    pub fn queue_update(&mut self, id: RecordId, patch: Fields) -> bool {
        if self.is_pending_delete(&id) {
            return false;
        }
        match self.to_update.iter_mut().find(|u| u.id == id) {
            Some(existing) => existing.patch = patch,
            None => self.to_update.push(PendingUpdate { id, patch }),
        }
        self.touch();
        true
    }

    pub fn cancel_update(&mut self, id: &RecordId) -> bool {
        let before = self.to_update.len();
        self.to_update.retain(|u| &u.id != id);
        let removed = self.to_update.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Mark a record for deletion.
    ///
    /// Drafts are simply discarded. For persisted records any pending update
    /// is dropped; undoing the delete later does not bring it back.
    pub fn queue_delete(&mut self, key: RecordKey, meta: DeleteMeta) {
        match key {
            RecordKey::Draft(temp_id) => {
                self.remove_draft(&temp_id);
            }
            RecordKey::Persisted(id) => {
                self.to_update.retain(|u| u.id != id);
                if !self.is_pending_delete(&id) {
                    self.to_delete.push(PendingDelete { id, meta });
                }
                self.touch();
            }
        }
    }

    pub fn cancel_delete(&mut self, id: &RecordId) -> bool {
        let before = self.to_delete.len();
        self.to_delete.retain(|d| &d.id != id);
        let removed = self.to_delete.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Drop everything queued.
    pub fn clear(&mut self) {
        self.to_add.clear();
        self.to_update.clear();
        self.to_delete.clear();
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Medication, StoredFile};
    use proptest::prelude::*;
    use serde_json::json;

    fn patch(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_add_edit_remove_draft() {
        let mut slice = StagedCollection::<Medication>::new();
        let a = slice.add_draft(Medication::new("Paracetamol"));
        let b = slice.add_draft(Medication::new("Ibuprofen"));

        slice.edit_draft(&a, Medication::new("Paracetamol 500mg")).unwrap();
        assert_eq!(slice.draft(&a).unwrap().data.name, "Paracetamol 500mg");

        assert!(slice.remove_draft(&b));
        assert!(!slice.remove_draft(&b));
        assert_eq!(slice.to_add().len(), 1);
    }

    #[test]
    fn test_edit_unknown_draft() {
        let mut slice = StagedCollection::<Medication>::new();
        let missing = TempId::parse("temp-1-missing").unwrap();
        let err = slice.edit_draft(&missing, Medication::new("x")).unwrap_err();
        assert!(matches!(err, StagingError::UnknownDraft(_)));
    }

    #[test]
    fn test_patch_draft_merges_fields() {
        let mut slice = StagedCollection::<Medication>::new();
        let temp_id = slice.add_draft(Medication::new("Sertraline"));
        slice
            .patch_draft(&temp_id, &patch(json!({"dosage": "50mg", "route": "oral"})))
            .unwrap();
        let draft = slice.draft(&temp_id).unwrap();
        assert_eq!(draft.data.name, "Sertraline");
        assert_eq!(draft.data.dosage.as_deref(), Some("50mg"));
        assert_eq!(draft.data.route.as_deref(), Some("oral"));
    }

    #[test]
    fn test_queue_update_last_write_wins() {
        let mut slice = StagedCollection::<Medication>::new();
        let id = RecordId::new("m1");
        slice.queue_update(id.clone(), patch(json!({"dosage": "10mg"})));
        slice.queue_update(id.clone(), patch(json!({"frequency": "daily"})));

        assert_eq!(slice.to_update().len(), 1);
        assert_eq!(
            slice.pending_update(&id).unwrap(),
            &patch(json!({"frequency": "daily"}))
        );
    }

    #[test]
    fn test_delete_supersedes_update_and_blocks_new_updates() {
        let mut slice = StagedCollection::<Medication>::new();
        let id = RecordId::new("m1");
        slice.queue_update(id.clone(), patch(json!({"dosage": "10mg"})));
        slice.queue_delete(RecordKey::Persisted(id.clone()), DeleteMeta::default());

        assert!(slice.pending_update(&id).is_none());
        assert!(slice.is_pending_delete(&id));
        assert!(!slice.queue_update(id.clone(), patch(json!({"dosage": "20mg"}))));
        assert!(slice.to_update().is_empty());

        // Undoing the delete does not restore the dropped update.
        assert!(slice.cancel_delete(&id));
        assert!(slice.pending_update(&id).is_none());
        assert!(slice.is_empty());
    }

    #[test]
    fn test_delete_of_draft_discards_it() {
        let mut slice = StagedCollection::<Medication>::new();
        let temp_id = slice.add_draft(Medication::new("Melatonin"));
        slice.queue_delete(RecordKey::Draft(temp_id.clone()), DeleteMeta::default());
        assert!(slice.draft(&temp_id).is_none());
        assert!(slice.to_delete().is_empty());
        assert!(slice.is_empty());
    }

    #[test]
    fn test_duplicate_delete_keeps_one_entry() {
        let mut slice = StagedCollection::<Medication>::new();
        let id = RecordId::new("m1");
        let meta = DeleteMeta {
            label: Some("Paracetamol".into()),
            file: Some(StoredFile {
                path: "p/x".into(),
                name: "x".into(),
            }),
        };
        slice.queue_delete(RecordKey::Persisted(id.clone()), meta.clone());
        slice.queue_delete(RecordKey::Persisted(id), meta);
        assert_eq!(slice.to_delete().len(), 1);
    }

    #[test]
    fn test_revision_bumps_on_mutation() {
        let mut slice = StagedCollection::<Medication>::new();
        let r0 = slice.revision();
        slice.add_draft(Medication::new("A"));
        assert!(slice.revision() > r0);

        let r1 = slice.revision();
        assert!(!slice.cancel_update(&RecordId::new("nope")));
        assert_eq!(slice.revision(), r1);
    }

    #[derive(Debug, Clone)]
    enum DraftOp {
        Add(String),
        Edit(usize, String),
        Remove(usize),
    }

    fn draft_op() -> impl Strategy<Value = DraftOp> {
        prop_oneof![
            "[a-z]{1,8}".prop_map(DraftOp::Add),
            (0usize..8, "[a-z]{1,8}").prop_map(|(i, s)| DraftOp::Edit(i, s)),
            (0usize..8).prop_map(DraftOp::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_one_entry_per_surviving_draft(ops in prop::collection::vec(draft_op(), 0..40)) {
            let mut slice = StagedCollection::<Medication>::new();
            let mut model: Vec<(TempId, String)> = Vec::new();

            for op in ops {
                match op {
                    DraftOp::Add(name) => {
                        let id = slice.add_draft(Medication::new(name.clone()));
                        model.push((id, name));
                    }
                    DraftOp::Edit(i, name) => {
                        if let Some((id, current)) = model.get_mut(i) {
                            slice.edit_draft(id, Medication::new(name.clone())).unwrap();
                            *current = name;
                        }
                    }
                    DraftOp::Remove(i) => {
                        if i < model.len() {
                            let (id, _) = model.remove(i);
                            prop_assert!(slice.remove_draft(&id));
                        }
                    }
                }
            }

            prop_assert_eq!(slice.to_add().len(), model.len());
            for (draft, (id, name)) in slice.to_add().iter().zip(&model) {
                prop_assert_eq!(&draft.temp_id, id);
                prop_assert_eq!(&draft.data.name, name);
            }
        }

        #[test]
        fn prop_second_update_wins(first in "[a-z]{1,6}", second in "[a-z]{1,6}") {
            let mut slice = StagedCollection::<Medication>::new();
            let id = RecordId::new("m1");
            slice.queue_update(id.clone(), patch(json!({"dosage": first})));
            slice.queue_update(id.clone(), patch(json!({"frequency": second.clone()})));
            prop_assert_eq!(slice.to_update().len(), 1);
            prop_assert_eq!(slice.pending_update(&id).unwrap(), &patch(json!({"frequency": second})));
        }

        #[test]
        fn prop_delete_removes_pending_update(ids in prop::collection::vec("[a-c]", 1..10)) {
            let mut slice = StagedCollection::<Medication>::new();
            for id in &ids {
                slice.queue_update(RecordId::new(id.as_str()), patch(json!({"notes": id})));
            }
            let target = RecordId::new(ids[0].as_str());
            slice.queue_delete(RecordKey::Persisted(target.clone()), DeleteMeta::default());
            prop_assert!(slice.pending_update(&target).is_none());
            prop_assert!(slice.to_update().iter().all(|u| !slice.is_pending_delete(&u.id)));
        }
    }
}
