//! Runtime configuration.

use std::path::Path;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Section;
use crate::validation::ValidationRules;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Blob storage bucket names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub documents_bucket: String,
    pub training_bucket: String,
    pub photos_bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            documents_bucket: "documents".to_string(),
            training_bucket: "training-certificates".to_string(),
            photos_bucket: "profile-photos".to_string(),
        }
    }
}

impl StorageConfig {
    /// Bucket holding files uploaded through `section`.
    pub fn bucket_for(&self, section: Section) -> &str {
        match section {
            Section::Training => &self.training_bucket,
            _ => &self.documents_bucket,
        }
    }
}

/// Roster calendar settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// First column of week and month views
    pub week_start: Weekday,
    /// Label of the bucket for shifts without a house
    pub unassigned_label: String,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            week_start: Weekday::Mon,
            unassigned_label: "Unassigned".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub validation: ValidationRules,
    pub roster: RosterConfig,
}

impl Config {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}
