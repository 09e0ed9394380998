//! Best-effort writes to the activity log.

use std::collections::BTreeMap;

use crate::models::{ActivityEntry, ActivityType, FieldChange, Fields, Section, Table};
use crate::store::RemoteStore;

use super::PageContext;

/// Writes audit entries for one page's entity. Failures are logged and dropped.
pub struct ActivityLogger<'a, S: ?Sized> {
    store: &'a S,
    context: &'a PageContext,
}

impl<'a, S: RemoteStore + ?Sized> ActivityLogger<'a, S> {
    pub fn new(store: &'a S, context: &'a PageContext) -> Self {
        Self { store, context }
    }

    /// Log a child record mutation, e.g. "Added goal: Walk to the shops".
    pub fn mutation(&self, activity_type: ActivityType, section: Section, label: &str) -> bool {
        let description = format!("{} {}: {}", activity_type.verb(), section.noun(), label);
        self.write(ActivityEntry::described(
            activity_type,
            self.context.entity_type,
            self.context.entity_id.clone(),
            self.context.entity_name.clone(),
            self.context.user_name.clone(),
            description,
        ))
    }

    /// Log field changes on the parent record.
    pub fn field_changes(&self, changes: BTreeMap<String, FieldChange>) -> bool {
        self.write(ActivityEntry::field_update(
            self.context.entity_type,
            self.context.entity_id.clone(),
            self.context.entity_name.clone(),
            self.context.user_name.clone(),
            changes,
        ))
    }

    fn write(&self, entry: ActivityEntry) -> bool {
        let record = match serde_json::to_value(&entry) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => Fields::new(),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to serialize activity entry");
                return false;
            }
        };
        match self.store.create(Table::ActivityLog, &record) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!(
                    entity = %self.context.entity_id,
                    activity = ?entry.activity_type,
                    error = %err,
                    "Failed to log activity"
                );
                false
            }
        }
    }
}
