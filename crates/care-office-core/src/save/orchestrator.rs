//! One save pass over a detail page.

use crate::config::Config;
use crate::dirty::{apply_patch, change_summary, diff_fields};
use crate::models::{ActivityType, FileUpload, Fields, RecordId, Section, StoredFile, TempId};
use crate::staging::{PendingChangeSet, PlannedMutation, PlannedOp};
use crate::store::{RemoteStore, StoreError};

use super::{ActivityLogger, PageContext, SaveError, SaveResult};

/// Field of the parent record holding the profile photo URL.
pub const PHOTO_URL_FIELD: &str = "photo_url";

/// Everything a save pass reads. Nothing here is modified.
#[derive(Debug, Clone, Copy)]
pub struct SaveRequest<'a> {
    pub context: &'a PageContext,
    /// Form data as currently edited
    pub current: &'a Fields,
    /// Last-known persisted parent record
    pub original: &'a Fields,
    pub changes: &'a PendingChangeSet,
    /// Newly selected profile photo
    pub photo: Option<&'a FileUpload>,
}

/// Outcome of a successful save pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SaveReport {
    /// New persisted snapshot of the parent record
    pub saved: Fields,
    /// Fields sent in the parent update (empty when nothing changed)
    pub parent_patch: Fields,
    /// Sections whose slice had queued changes
    pub touched: Vec<Section>,
    /// Child create/update/delete calls issued
    pub mutations: usize,
    /// Store ids assigned to drafts
    pub created: Vec<(TempId, RecordId)>,
}

/// Applies a page's pending changes to a store.
pub struct SaveOrchestrator<'a, S: ?Sized> {
    store: &'a S,
    config: &'a Config,
}

fn mutation_failed(mutation: &PlannedMutation, action: &'static str, source: StoreError) -> SaveError {
    tracing::error!(
        section = %mutation.section,
        label = %mutation.label,
        action,
        error = %source,
        "Remote mutation failed"
    );
    SaveError::Mutation {
        section: mutation.section,
        action,
        label: mutation.label.clone(),
        source,
    }
}

fn storage_failed(bucket: &str, path: &str, source: StoreError) -> SaveError {
    tracing::error!(bucket, path, error = %source, "File storage failed");
    SaveError::Storage {
        bucket: bucket.to_string(),
        path: path.to_string(),
        source,
    }
}

impl<'a, S: RemoteStore + ?Sized> SaveOrchestrator<'a, S> {
    pub fn new(store: &'a S, config: &'a Config) -> Self {
        Self { store, config }
    }

    /// Run a full save pass, stopping at the first failing remote call.
    pub fn run(&self, request: SaveRequest<'_>) -> SaveResult<SaveReport> {
        let context = request.context;
        let mut parent_patch = diff_fields(request.current, request.original);

        if !parent_patch.is_empty() {
            self.config
                .validation
                .check(&parent_patch, request.original)?;
        }

        let plan = request.changes.plan(&context.entity_id)?;
        let touched = request.changes.dirty_sections();

        tracing::info!(
            entity = %context.entity_id,
            entity_type = %context.entity_type,
            mutations = plan.len(),
            parent_fields = parent_patch.len(),
            "Saving detail page"
        );

        let logger = ActivityLogger::new(self.store, context);
        let mut created = Vec::new();

        for mutation in &plan {
            if let Some(assigned) = self.apply(context, mutation, &logger)? {
                created.push(assigned);
            }
        }

        if let Some(photo) = request.photo {
            let bucket = &self.config.storage.photos_bucket;
            let path = format!("{}/profile-{}", context.entity_id, photo.file_name);
            self.store
                .upload_file(bucket, &path, photo)
                .map_err(|err| storage_failed(bucket, &path, err))?;
            parent_patch.insert(
                PHOTO_URL_FIELD.to_string(),
                self.store.public_url(bucket, &path).into(),
            );
        }

        if !parent_patch.is_empty() {
            tracing::debug!(entity = %context.entity_id, fields = parent_patch.len(), "Updating parent record");
            self.store
                .update(context.entity_type.table(), &context.entity_id, &parent_patch)
                .map_err(|err| {
                    tracing::error!(entity = %context.entity_id, error = %err, "Parent update failed");
                    SaveError::Parent(err)
                })?;
        }

        let mut saved = request.original.clone();
        apply_patch(&mut saved, &parent_patch);

        let summary = change_summary(request.original, &saved);
        if !summary.is_empty() {
            logger.field_changes(summary);
        }

        tracing::info!(
            entity = %context.entity_id,
            mutations = plan.len(),
            "Saved detail page"
        );

        Ok(SaveReport {
            saved,
            parent_patch,
            touched,
            mutations: plan.len(),
            created,
        })
    }

    fn apply(
        &self,
        context: &PageContext,
        mutation: &PlannedMutation,
        logger: &ActivityLogger<'_, S>,
    ) -> SaveResult<Option<(TempId, RecordId)>> {
        let table = mutation.section.table();
        let bucket = self.config.storage.bucket_for(mutation.section);

        match &mutation.op {
            PlannedOp::Create {
                temp_id,
                record,
                upload,
            } => {
                if let Some(planned) = upload {
                    self.upload(bucket, &planned.file, &planned.upload)?;
                }
                let mut record = record.clone();
                record.insert(
                    context.entity_type.foreign_key().to_string(),
                    context.entity_id.as_str().into(),
                );
                tracing::debug!(section = %mutation.section, temp_id = %temp_id, "Creating record");
                let stored = self
                    .store
                    .create(table, &record)
                    .map_err(|err| mutation_failed(mutation, "add", err))?;
                logger.mutation(ActivityType::Create, mutation.section, &mutation.label);
                Ok(stored
                    .get("id")
                    .and_then(|id| id.as_str())
                    .map(|id| (temp_id.clone(), RecordId::new(id))))
            }
            PlannedOp::Update { id, patch } => {
                tracing::debug!(section = %mutation.section, id = %id, "Updating record");
                self.store
                    .update(table, id, patch)
                    .map_err(|err| mutation_failed(mutation, "update", err))?;
                logger.mutation(ActivityType::Update, mutation.section, &mutation.label);
                Ok(None)
            }
            PlannedOp::Delete { id, file } => {
                if let Some(file) = file {
                    self.store
                        .remove_file(bucket, &file.path)
                        .map_err(|err| storage_failed(bucket, &file.path, err))?;
                }
                tracing::debug!(section = %mutation.section, id = %id, "Deleting record");
                self.store
                    .delete(table, id)
                    .map_err(|err| mutation_failed(mutation, "remove", err))?;
                logger.mutation(ActivityType::Delete, mutation.section, &mutation.label);
                Ok(None)
            }
        }
    }

    fn upload(&self, bucket: &str, file: &StoredFile, upload: &FileUpload) -> SaveResult<()> {
        tracing::debug!(bucket, path = %file.path, bytes = upload.bytes.len(), "Uploading file");
        self.store
            .upload_file(bucket, &file.path, upload)
            .map_err(|err| storage_failed(bucket, &file.path, err))
    }
}
