//! Status-conditional required fields.
//!
//! A rule makes a field mandatory once the record's status is in a given set
//! (e.g., name and email are needed before a staff member leaves `draft`).
//! Rules are checked against the post-change record: incoming changes layered
//! over the persisted values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dirty::is_blank;
use crate::models::Fields;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{label} is required when status is {status}")]
    MissingRequired {
        field: String,
        label: String,
        status: String,
    },
}

impl ValidationError {
    /// Form field to mark and scroll to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingRequired { field, .. } => field,
        }
    }
}

/// A field that becomes mandatory for certain statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredWhen {
    pub field: String,
    /// Label used in messages; defaults to the field name
    #[serde(default)]
    pub label: Option<String>,
    /// Statuses in which the field is required
    pub statuses: Vec<String>,
}

impl RequiredWhen {
    pub fn new(field: &str, label: &str, statuses: &[&str]) -> Self {
        Self {
            field: field.to_string(),
            label: Some(label.to_string()),
            statuses: statuses.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.field)
    }
}

/// Rule set applied to the parent record before a save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRules {
    /// Field holding the record status
    pub status_field: String,
    pub rules: Vec<RequiredWhen>,
}

impl Default for ValidationRules {
    fn default() -> Self {
        Self {
            status_field: "status".to_string(),
            rules: vec![
                RequiredWhen::new("name", "Name", &["active", "inactive"]),
                RequiredWhen::new("email", "Email", &["active", "inactive"]),
            ],
        }
    }
}

fn effective<'a>(
    field: &str,
    changes: &'a Fields,
    existing: &'a Fields,
) -> Option<&'a serde_json::Value> {
    if changes.contains_key(field) {
        changes.get(field)
    } else {
        existing.get(field)
    }
}

impl ValidationRules {
    /// Rules that never fail.
    pub fn none() -> Self {
        Self {
            status_field: "status".to_string(),
            rules: Vec::new(),
        }
    }

    /// Check the post-change record, reporting the first failing rule.
    pub fn check(&self, changes: &Fields, existing: &Fields) -> Result<(), ValidationError> {
        let status = match effective(&self.status_field, changes, existing) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s.as_str(),
            _ => return Ok(()),
        };

        for rule in &self.rules {
            if !rule.statuses.iter().any(|s| s == status) {
                continue;
            }
            if is_blank(effective(&rule.field, changes, existing)) {
                return Err(ValidationError::MissingRequired {
                    field: rule.field.clone(),
                    label: rule.label().to_string(),
                    status: status.to_string(),
                });
            }
        }
        Ok(())
    }
}
