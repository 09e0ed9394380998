//! Record identifiers.
//!
//! Persisted records carry a store-assigned [`RecordId`]. Records created
//! locally and not yet saved carry a [`TempId`] instead; the two never
//! coexist on one record.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix shared by every client-generated temporary id.
pub const TEMP_ID_PREFIX: &str = "temp-";

/// Identifier assigned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Client-generated id of an unsaved draft, formatted `temp-<timestamp>-<random>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TempId(String);

impl TempId {
    /// Generate a fresh temp id from the current time and a random suffix.
    pub fn generate() -> Self {
        let millis = chrono::Utc::now().timestamp_millis();
        let random = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}{}-{}", TEMP_ID_PREFIX, millis, &random[..9]))
    }

    /// Wrap an existing temp id string, rejecting anything without the prefix.
    pub fn parse(s: &str) -> Option<Self> {
        s.starts_with(TEMP_ID_PREFIX).then(|| Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TempId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of a row in a section list: either an unsaved draft or a persisted record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    Draft(TempId),
    Persisted(RecordId),
}

impl RecordKey {
    /// Classify a raw key coming from the host UI.
    pub fn parse(s: &str) -> Self {
        match TempId::parse(s) {
            Some(temp_id) => RecordKey::Draft(temp_id),
            None => RecordKey::Persisted(RecordId::new(s)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            RecordKey::Draft(temp_id) => temp_id.as_str(),
            RecordKey::Persisted(id) => id.as_str(),
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, RecordKey::Draft(_))
    }
}

impl From<TempId> for RecordKey {
    fn from(temp_id: TempId) -> Self {
        RecordKey::Draft(temp_id)
    }
}

impl From<RecordId> for RecordKey {
    fn from(id: RecordId) -> Self {
        RecordKey::Persisted(id)
    }
}
