//! Batch save integration tests.

use std::cell::{Cell, RefCell};

use care_office_core::config::Config;
use care_office_core::models::{
    ComplianceRecord, Contact, Document, EntityType, FileUpload, Fields, Goal, RecordId,
    RecordKey, Section, Table, TrainingRecord,
};
use care_office_core::save::{DetailPage, SaveError};
use care_office_core::store::{
    load_section, Filter, Order, RemoteError, RemoteStore, SqliteStore, StoreError, StoreResult,
};
use serde_json::json;

/// SQLite store that records every call and fails on request.
struct FlakyStore {
    inner: SqliteStore,
    calls: RefCell<Vec<String>>,
    creates: Cell<usize>,
    /// Fail the n-th (1-based) child or parent create
    fail_create_at: Cell<Option<usize>>,
    fail_uploads: Cell<bool>,
    fail_activity: Cell<bool>,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            calls: RefCell::new(Vec::new()),
            creates: Cell::new(0),
            fail_create_at: Cell::new(None),
            fail_uploads: Cell::new(false),
            fail_activity: Cell::new(false),
        }
    }

    /// Calls other than activity log writes.
    fn mutations(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| !c.starts_with("create:activity_log"))
            .cloned()
            .collect()
    }

    fn reset_calls(&self) {
        self.calls.borrow_mut().clear();
    }
}

impl RemoteStore for FlakyStore {
    fn create(&self, table: Table, record: &Fields) -> StoreResult<Fields> {
        self.calls.borrow_mut().push(format!("create:{}", table));
        if table == Table::ActivityLog {
            if self.fail_activity.get() {
                return Err(StoreError::Remote(RemoteError::new(None, "audit log offline")));
            }
            return self.inner.create(table, record);
        }
        self.creates.set(self.creates.get() + 1);
        if self.fail_create_at.get() == Some(self.creates.get()) {
            return Err(StoreError::Remote(
                RemoteError::new(Some("23505"), "duplicate key value violates unique constraint")
                    .with_details("Key (title)=(Catch the bus) already exists."),
            ));
        }
        self.inner.create(table, record)
    }

    fn update(&self, table: Table, id: &RecordId, patch: &Fields) -> StoreResult<()> {
        self.calls.borrow_mut().push(format!("update:{}:{}", table, id));
        self.inner.update(table, id, patch)
    }

    fn delete(&self, table: Table, id: &RecordId) -> StoreResult<()> {
        self.calls.borrow_mut().push(format!("delete:{}:{}", table, id));
        self.inner.delete(table, id)
    }

    fn query(
        &self,
        table: Table,
        filters: &[Filter],
        order: Option<&Order>,
    ) -> StoreResult<Vec<Fields>> {
        self.inner.query(table, filters, order)
    }

    fn upload_file(&self, bucket: &str, path: &str, file: &FileUpload) -> StoreResult<()> {
        self.calls.borrow_mut().push(format!("upload:{}/{}", bucket, path));
        if self.fail_uploads.get() {
            return Err(StoreError::Remote(RemoteError::new(None, "bucket is full")));
        }
        self.inner.upload_file(bucket, path, file)
    }

    fn download_file(&self, bucket: &str, path: &str) -> StoreResult<Vec<u8>> {
        self.inner.download_file(bucket, path)
    }

    fn remove_file(&self, bucket: &str, path: &str) -> StoreResult<()> {
        self.calls.borrow_mut().push(format!("remove_file:{}/{}", bucket, path));
        self.inner.remove_file(bucket, path)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.inner.public_url(bucket, path)
    }
}

fn fields(value: serde_json::Value) -> Fields {
    value.as_object().cloned().unwrap()
}

fn seed_participant(store: &FlakyStore) -> RecordId {
    let stored = store
        .inner
        .create(
            Table::Participants,
            &fields(json!({
                "first_name": "Sam",
                "last_name": "Lee",
                "name": "Sam Lee",
                "email": "",
                "status": "draft",
            })),
        )
        .unwrap();
    RecordId::new(stored["id"].as_str().unwrap())
}

fn open(store: &FlakyStore) -> DetailPage {
    let id = seed_participant(store);
    DetailPage::open(store, EntityType::Participant, id, "coordinator").unwrap()
}

#[test]
fn test_unchanged_page_saves_nothing() {
    let store = FlakyStore::new();
    let mut page = open(&store);

    let report = page.save(&store, &Config::default()).unwrap();

    assert_eq!(report.mutations, 0);
    assert!(report.parent_patch.is_empty());
    assert!(store.calls.borrow().is_empty());
    assert!(!page.is_dirty());
}

#[test]
fn test_blank_equivalent_edits_save_nothing() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    page.set_field("email", serde_json::Value::Null);
    page.set_field("phone", json!(""));

    page.save(&store, &Config::default()).unwrap();

    assert!(store.calls.borrow().is_empty());
}

#[test]
fn test_validation_rejects_before_any_remote_call() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    page.set_field("status", json!("active"));
    page.set_field("email", json!(""));
    page.slice_mut::<Goal>()
        .unwrap()
        .add_draft(Goal::new("Catch the bus"));

    let err = page.save(&store, &Config::default()).unwrap_err();

    assert!(matches!(err, SaveError::Validation(_)));
    assert_eq!(err.field(), Some("email"));
    assert!(page.field_error("email").is_some());
    assert!(store.calls.borrow().is_empty());
    assert!(page.is_dirty());
    assert_eq!(page.changes().slice::<Goal>().unwrap().to_add().len(), 1);
}

#[test]
fn test_partial_failure_keeps_buffer() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    for title in ["Cook dinner", "Catch the bus", "Join a club"] {
        page.slice_mut::<Goal>().unwrap().add_draft(Goal::new(title));
    }
    store.fail_create_at.set(Some(2));

    let err = page.save(&store, &Config::default()).unwrap_err();

    // The first create went through and stays.
    let goals = store.inner.query(Table::Goals, &[], None).unwrap();
    assert_eq!(goals.len(), 1);
    assert_eq!(goals[0]["title"], "Cook dinner");

    // One failure, one toast.
    let friendly = err.friendly();
    assert_eq!(friendly.title, "Duplicate entry");
    assert_eq!(friendly.description, "A record with this title already exists.");
    assert!(err.to_string().contains("Catch the bus"));

    // Third create never attempted, buffer untouched.
    assert_eq!(
        store.mutations(),
        vec!["create:goals".to_string(), "create:goals".to_string()]
    );
    assert_eq!(page.changes().slice::<Goal>().unwrap().to_add().len(), 3);
    assert!(page.is_dirty());
    assert_eq!(page.refresh_count(Section::Goals), 0);

    // Resubmitting sends the same buffer again.
    store.fail_create_at.set(None);
    store.reset_calls();
    let report = page.save(&store, &Config::default()).unwrap();
    assert_eq!(report.mutations, 3);
    assert_eq!(store.inner.count(Table::Goals).unwrap(), 4);
    assert!(!page.is_dirty());
}

#[test]
fn test_sections_save_in_fixed_order() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    page.slice_mut::<Contact>()
        .unwrap()
        .add_draft(Contact::new("Jo"));
    page.slice_mut::<Goal>()
        .unwrap()
        .add_draft(Goal::new("Cook dinner"));
    page.slice_mut::<ComplianceRecord>()
        .unwrap()
        .add_draft(ComplianceRecord::new("NDIS worker screening"));

    let report = page.save(&store, &Config::default()).unwrap();

    assert_eq!(
        store.mutations(),
        vec![
            "create:compliance".to_string(),
            "create:goals".to_string(),
            "create:contacts".to_string(),
        ]
    );
    assert_eq!(
        report.touched,
        vec![Section::Compliance, Section::Goals, Section::Contacts]
    );
    assert_eq!(page.refresh_count(Section::Compliance), 1);
    assert_eq!(page.refresh_count(Section::Contacts), 1);
    assert_eq!(page.refresh_count(Section::Funding), 0);
}

#[test]
fn test_adds_then_updates_then_deletes_within_a_section() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    let owner = page.context().entity_id.clone();
    let mut ids = Vec::new();
    for name in ["Mum", "Dad"] {
        let stored = store
            .inner
            .create(
                Table::Contacts,
                &fields(json!({"name": name, "participant_id": owner.as_str()})),
            )
            .unwrap();
        ids.push(RecordId::new(stored["id"].as_str().unwrap()));
    }

    let persisted = load_section::<Contact, _>(&store, EntityType::Participant, &owner).unwrap();
    {
        let mut editor = page.editor(&persisted).unwrap();
        editor.stage_delete(&RecordKey::Persisted(ids[0].clone())).unwrap();
        let mut dad = persisted[1].data.clone();
        dad.phone = Some("0400 111 222".to_string());
        assert!(editor.stage_edit(&ids[1], &dad).unwrap());
        editor.add(Contact::new("Aunt Bea"));
    }

    page.save(&store, &Config::default()).unwrap();

    assert_eq!(
        store.mutations(),
        vec![
            "create:contacts".to_string(),
            format!("update:contacts:{}", ids[1]),
            format!("delete:contacts:{}", ids[0]),
        ]
    );
    let contacts = load_section::<Contact, _>(&store, EntityType::Participant, &owner).unwrap();
    let names: Vec<&str> = contacts.iter().map(|c| c.data.name.as_str()).collect();
    assert_eq!(names, vec!["Dad", "Aunt Bea"]);
    assert_eq!(contacts[0].data.phone.as_deref(), Some("0400 111 222"));
}

#[test]
fn test_document_delete_removes_file_first() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    let owner = page.context().entity_id.clone();
    let path = format!("{}/agreement.pdf", owner);
    store
        .inner
        .upload_file(
            "documents",
            &path,
            &FileUpload::new("agreement.pdf", None, b"%PDF".to_vec()),
        )
        .unwrap();
    let stored = store
        .inner
        .create(
            Table::Documents,
            &fields(json!({
                "title": "Service agreement",
                "file_path": path,
                "file_name": "agreement.pdf",
                "participant_id": owner.as_str(),
            })),
        )
        .unwrap();
    let doc_id = RecordId::new(stored["id"].as_str().unwrap());

    let persisted = load_section::<Document, _>(&store, EntityType::Participant, &owner).unwrap();
    page.editor(&persisted)
        .unwrap()
        .stage_delete(&RecordKey::Persisted(doc_id.clone()))
        .unwrap();
    page.save(&store, &Config::default()).unwrap();

    assert_eq!(
        store.mutations(),
        vec![
            format!("remove_file:documents/{}", path),
            format!("delete:documents:{}", doc_id),
        ]
    );
    assert!(!store.inner.file_exists("documents", &path).unwrap());

    let log = store.inner.query(Table::ActivityLog, &[], None).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(
        log[0]["custom_description"],
        "Removed document: Service agreement"
    );
}

#[test]
fn test_training_upload_lands_before_record() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    let owner = page.context().entity_id.clone();
    let temp_id = page
        .slice_mut::<TrainingRecord>()
        .unwrap()
        .add_draft_with_upload(
            TrainingRecord::new("First aid"),
            FileUpload::new("cert.pdf", Some("application/pdf".to_string()), vec![1, 2]),
        );

    page.save(&store, &Config::default()).unwrap();

    let expected_path = format!("{}/{}-cert.pdf", owner, temp_id);
    assert_eq!(
        store.mutations(),
        vec![
            format!("upload:training-certificates/{}", expected_path),
            "create:training".to_string(),
        ]
    );
    let saved = load_section::<TrainingRecord, _>(&store, EntityType::Participant, &owner).unwrap();
    assert_eq!(saved[0].data.certificate_path.as_deref(), Some(expected_path.as_str()));
    assert_eq!(saved[0].data.certificate_name.as_deref(), Some("cert.pdf"));
}

#[test]
fn test_upload_failure_aborts_before_record() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    page.slice_mut::<Document>().unwrap().add_draft_with_upload(
        Document::new("Plan"),
        FileUpload::new("plan.pdf", None, vec![0]),
    );
    store.fail_uploads.set(true);

    let err = page.save(&store, &Config::default()).unwrap_err();

    assert!(matches!(err, SaveError::Storage { .. }));
    assert_eq!(err.friendly().title, "File storage error");
    assert_eq!(store.inner.count(Table::Documents).unwrap(), 0);
    assert!(page.is_dirty());
}

#[test]
fn test_retry_after_failed_save_uploads_file_again() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    let owner = page.context().entity_id.clone();
    let temp_id = page.slice_mut::<Document>().unwrap().add_draft_with_upload(
        Document::new("Plan"),
        FileUpload::new("plan.pdf", Some("application/pdf".to_string()), vec![1]),
    );
    let missing = RecordId::new("missing-goal");
    page.changes_mut()
        .queue_update(Section::Goals, missing.clone(), fields(json!({"progress": 50})))
        .unwrap();

    // Documents save before goals, so the file is already stored when the update fails.
    let err = page.save(&store, &Config::default()).unwrap_err();
    assert!(matches!(
        err,
        SaveError::Mutation { source: StoreError::NotFound { .. }, .. }
    ));
    let path = format!("{}/{}-plan.pdf", owner, temp_id);
    assert!(store.inner.file_exists("documents", &path).unwrap());
    assert!(page.is_dirty());

    page.changes_mut().cancel_update(Section::Goals, &missing).unwrap();
    store.reset_calls();
    page.save(&store, &Config::default()).unwrap();

    assert_eq!(
        store.mutations(),
        vec![format!("upload:documents/{}", path), "create:documents".to_string()]
    );
    assert_eq!(store.inner.download_file("documents", &path).unwrap(), vec![1]);
    // No rollback: the record from the failed attempt stays.
    assert_eq!(store.inner.count(Table::Documents).unwrap(), 2);
    assert!(!page.is_dirty());
}

#[test]
fn test_replacing_photo_with_same_name() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    let id = page.context().entity_id.clone();
    let path = format!("{}/profile-me.jpg", id);

    page.select_photo(FileUpload::new("me.jpg", Some("image/jpeg".to_string()), vec![1]));
    page.save(&store, &Config::default()).unwrap();
    page.select_photo(FileUpload::new("me.jpg", Some("image/jpeg".to_string()), vec![2, 3]));
    let report = page.save(&store, &Config::default()).unwrap();

    assert_eq!(
        store.inner.download_file("profile-photos", &path).unwrap(),
        vec![2, 3]
    );
    let expected = format!("local://storage/profile-photos/{}", path);
    assert_eq!(report.parent_patch["photo_url"], expected.as_str());
    assert!(!page.is_dirty());
}

#[test]
fn test_parent_patch_and_activity_summary() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    let id = page.context().entity_id.clone();
    page.set_field("phone", json!("0400 000 000"));
    page.set_field("last_name", json!("Lee-Wong"));

    let report = page.save(&store, &Config::default()).unwrap();

    assert_eq!(store.mutations(), vec![format!("update:participants:{}", id)]);
    assert_eq!(report.parent_patch.len(), 2);
    assert_eq!(page.breadcrumb(), "Participants / Sam Lee-Wong");

    let log = store.inner.query(Table::ActivityLog, &[], None).unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0]["activity_type"], "update");
    assert_eq!(log[0]["changes"]["last_name"]["old"], "Lee");
    assert_eq!(log[0]["changes"]["last_name"]["new"], "Lee-Wong");
}

#[test]
fn test_activity_failure_does_not_block_save() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    store.fail_activity.set(true);
    page.slice_mut::<Goal>()
        .unwrap()
        .add_draft(Goal::new("Cook dinner"));
    page.set_field("phone", json!("0400"));

    page.save(&store, &Config::default()).unwrap();

    assert_eq!(store.inner.count(Table::Goals).unwrap(), 1);
    assert_eq!(store.inner.count(Table::ActivityLog).unwrap(), 0);
    assert!(!page.is_dirty());
}

#[test]
fn test_profile_photo_sets_url() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    let id = page.context().entity_id.clone();
    page.select_photo(FileUpload::new("sam.jpg", Some("image/jpeg".to_string()), vec![9]));
    assert!(page.is_dirty());

    let report = page.save(&store, &Config::default()).unwrap();

    let expected = format!("local://storage/profile-photos/{}/profile-sam.jpg", id);
    assert_eq!(report.parent_patch["photo_url"], expected.as_str());
    let stored = store.inner.get(Table::Participants, &id).unwrap().unwrap();
    assert_eq!(stored["photo_url"], expected.as_str());
    assert!(!page.is_dirty());
}

#[test]
fn test_deleted_parent_reports_not_found() {
    let store = FlakyStore::new();
    let mut page = open(&store);
    let id = page.context().entity_id.clone();
    store.inner.delete(Table::Participants, &id).unwrap();
    page.set_field("phone", json!("0400"));

    let err = page.save(&store, &Config::default()).unwrap_err();

    assert!(matches!(err, SaveError::Parent(StoreError::NotFound { .. })));
    assert_eq!(err.friendly().title, "Record not found");
    assert!(page.is_dirty());
}
