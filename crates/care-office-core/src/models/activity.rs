//! Activity (audit) log entries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{EntityType, RecordId};

/// What happened to the logged entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Create,
    Update,
    Delete,
}

impl ActivityType {
    /// Past-tense verb for descriptions.
    pub fn verb(self) -> &'static str {
        match self {
            ActivityType::Create => "Added",
            ActivityType::Update => "Updated",
            ActivityType::Delete => "Removed",
        }
    }
}

/// Old and new value of one changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub old: serde_json::Value,
    pub new: serde_json::Value,
}

/// One row of the activity log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub activity_type: ActivityType,
    pub entity_type: EntityType,
    pub entity_id: RecordId,
    pub entity_name: String,
    pub user_name: String,
    /// Field-level changes, for updates of the parent record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<BTreeMap<String, FieldChange>>,
    /// Free-text description, for child record mutations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_description: Option<String>,
    pub created_at: String,
}

impl ActivityEntry {
    /// Entry describing a child record mutation.
    pub fn described(
        activity_type: ActivityType,
        entity_type: EntityType,
        entity_id: RecordId,
        entity_name: String,
        user_name: String,
        description: String,
    ) -> Self {
        Self {
            activity_type,
            entity_type,
            entity_id,
            entity_name,
            user_name,
            changes: None,
            custom_description: Some(description),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Entry summarising field changes on the parent record.
    pub fn field_update(
        entity_type: EntityType,
        entity_id: RecordId,
        entity_name: String,
        user_name: String,
        changes: BTreeMap<String, FieldChange>,
    ) -> Self {
        Self {
            activity_type: ActivityType::Update,
            entity_type,
            entity_id,
            entity_name,
            user_name,
            changes: Some(changes),
            custom_description: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Text shown in the activity feed.
    pub fn description(&self) -> String {
        if let Some(description) = &self.custom_description {
            return description.clone();
        }
        match &self.changes {
            Some(changes) if !changes.is_empty() => {
                let fields: Vec<&str> = changes.keys().map(String::as_str).collect();
                format!(
                    "{} {} {}: {}",
                    self.activity_type.verb(),
                    self.entity_type,
                    self.entity_name,
                    fields.join(", ")
                )
            }
            _ => format!(
                "{} {} {}",
                self.activity_type.verb(),
                self.entity_type,
                self.entity_name
            ),
        }
    }
}
