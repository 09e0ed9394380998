//! Uploaded documents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Section, SectionRecord, StoredFile};

/// Metadata for a file kept against a staff member or participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub category: Option<String>,
    pub file_path: Option<String>,
    pub file_name: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            category: None,
            file_path: None,
            file_name: None,
            expiry_date: None,
        }
    }
}

impl SectionRecord for Document {
    const SECTION: Section = Section::Documents;
    const LABEL_FIELD: &'static str = "title";

    fn label(&self) -> String {
        self.title.clone()
    }

    fn stored_file(&self) -> Option<StoredFile> {
        let path = self.file_path.clone()?;
        let name = self.file_name.clone().unwrap_or_else(|| self.title.clone());
        Some(StoredFile { path, name })
    }

    fn attach_file(&mut self, file: &StoredFile) {
        self.file_path = Some(file.path.clone());
        self.file_name = Some(file.name.clone());
    }
}
