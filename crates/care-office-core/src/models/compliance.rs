//! Staff compliance and training records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Section, SectionRecord, StoredFile};

/// Days before expiry at which a record is flagged as expiring soon.
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// Expiry state of a dated credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Expired,
    ExpiringSoon,
    Current,
    NoExpiry,
}

impl ExpiryStatus {
    pub fn evaluate(expires_on: Option<NaiveDate>, today: NaiveDate) -> Self {
        match expires_on {
            None => ExpiryStatus::NoExpiry,
            Some(date) => {
                let days_left = (date - today).num_days();
                if days_left < 0 {
                    ExpiryStatus::Expired
                } else if days_left <= EXPIRY_WARNING_DAYS {
                    ExpiryStatus::ExpiringSoon
                } else {
                    ExpiryStatus::Current
                }
            }
        }
    }
}

/// A screening check or registration a staff member must hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    /// Requirement name (e.g., "NDIS Worker Screening")
    pub requirement: String,
    pub reference_number: Option<String>,
    pub issued_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl ComplianceRecord {
    pub fn new(requirement: impl Into<String>) -> Self {
        Self {
            requirement: requirement.into(),
            reference_number: None,
            issued_on: None,
            expires_on: None,
            notes: None,
        }
    }

    pub fn expiry_status(&self, today: NaiveDate) -> ExpiryStatus {
        ExpiryStatus::evaluate(self.expires_on, today)
    }
}

impl SectionRecord for ComplianceRecord {
    const SECTION: Section = Section::Compliance;
    const LABEL_FIELD: &'static str = "requirement";

    fn label(&self) -> String {
        self.requirement.clone()
    }
}

/// A completed course, optionally with an uploaded certificate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub course_name: String,
    pub provider: Option<String>,
    pub completed_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
    pub certificate_path: Option<String>,
    pub certificate_name: Option<String>,
}

impl TrainingRecord {
    pub fn new(course_name: impl Into<String>) -> Self {
        Self {
            course_name: course_name.into(),
            provider: None,
            completed_on: None,
            expires_on: None,
            certificate_path: None,
            certificate_name: None,
        }
    }

    pub fn expiry_status(&self, today: NaiveDate) -> ExpiryStatus {
        ExpiryStatus::evaluate(self.expires_on, today)
    }
}

impl SectionRecord for TrainingRecord {
    const SECTION: Section = Section::Training;
    const LABEL_FIELD: &'static str = "course_name";

    fn label(&self) -> String {
        self.course_name.clone()
    }

    fn stored_file(&self) -> Option<StoredFile> {
        let path = self.certificate_path.clone()?;
        let name = self
            .certificate_name
            .clone()
            .unwrap_or_else(|| path.rsplit('/').next().unwrap_or_default().to_string());
        Some(StoredFile { path, name })
    }

    fn attach_file(&mut self, file: &StoredFile) {
        self.certificate_path = Some(file.path.clone());
        self.certificate_name = Some(file.name.clone());
    }
}
