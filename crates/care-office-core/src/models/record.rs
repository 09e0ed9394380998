//! Record shapes shared by every section.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::RecordId;

/// Loosely typed top-level fields of a record, form or patch.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// A record as returned by the store: its id plus the typed body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persisted<T> {
    pub id: RecordId,
    #[serde(flatten)]
    pub data: T,
}

impl<T> Persisted<T> {
    pub fn new(id: impl Into<RecordId>, data: T) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Reference to a file held in blob storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Path inside the bucket
    pub path: String,
    /// Original file name shown to users
    pub name: String,
}

/// A locally selected file waiting to be uploaded.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes,
        }
    }
}

// Payloads can be large; keep them out of debug output.
impl fmt::Debug for FileUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Remote record collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Staff,
    Participants,
    Shifts,
    LeaveBlocks,
    Compliance,
    Training,
    Documents,
    Medications,
    ServiceProviders,
    ShiftNotes,
    Goals,
    GoalProgress,
    Funding,
    Contacts,
    ActivityLog,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Staff => "staff",
            Table::Participants => "participants",
            Table::Shifts => "shifts",
            Table::LeaveBlocks => "leave_blocks",
            Table::Compliance => "compliance",
            Table::Training => "training",
            Table::Documents => "documents",
            Table::Medications => "medications",
            Table::ServiceProviders => "service_providers",
            Table::ShiftNotes => "shift_notes",
            Table::Goals => "goals",
            Table::GoalProgress => "goal_progress",
            Table::Funding => "funding",
            Table::Contacts => "contacts",
            Table::ActivityLog => "activity_log",
        }
    }

    const ALL: [Table; 15] = [
        Table::Staff,
        Table::Participants,
        Table::Shifts,
        Table::LeaveBlocks,
        Table::Compliance,
        Table::Training,
        Table::Documents,
        Table::Medications,
        Table::ServiceProviders,
        Table::ShiftNotes,
        Table::Goals,
        Table::GoalProgress,
        Table::Funding,
        Table::Contacts,
        Table::ActivityLog,
    ];
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown table: {}", s))
    }
}

/// Editable child sections of a detail page.
///
/// Declaration order is the fixed batch-save order; `Ord` follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Compliance,
    Training,
    Documents,
    Medications,
    ServiceProviders,
    ShiftNotes,
    Goals,
    Funding,
    Contacts,
}

impl Section {
    /// Every section in batch-save order.
    pub const SAVE_ORDER: [Section; 9] = [
        Section::Compliance,
        Section::Training,
        Section::Documents,
        Section::Medications,
        Section::ServiceProviders,
        Section::ShiftNotes,
        Section::Goals,
        Section::Funding,
        Section::Contacts,
    ];

    pub fn table(self) -> Table {
        match self {
            Section::Compliance => Table::Compliance,
            Section::Training => Table::Training,
            Section::Documents => Table::Documents,
            Section::Medications => Table::Medications,
            Section::ServiceProviders => Table::ServiceProviders,
            Section::ShiftNotes => Table::ShiftNotes,
            Section::Goals => Table::Goals,
            Section::Funding => Table::Funding,
            Section::Contacts => Table::Contacts,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Compliance => "compliance",
            Section::Training => "training",
            Section::Documents => "documents",
            Section::Medications => "medications",
            Section::ServiceProviders => "service_providers",
            Section::ShiftNotes => "shift_notes",
            Section::Goals => "goals",
            Section::Funding => "funding",
            Section::Contacts => "contacts",
        }
    }

    /// Singular noun used in activity descriptions and error messages.
    pub fn noun(self) -> &'static str {
        match self {
            Section::Compliance => "compliance record",
            Section::Training => "training record",
            Section::Documents => "document",
            Section::Medications => "medication",
            Section::ServiceProviders => "service provider",
            Section::ShiftNotes => "shift note",
            Section::Goals => "goal",
            Section::Funding => "funding record",
            Section::Contacts => "contact",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::SAVE_ORDER
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| format!("Unknown section: {}", s))
    }
}

/// A child record type edited through a staged section.
pub trait SectionRecord:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + 'static
{
    /// Section this record type belongs to.
    const SECTION: Section;

    /// Field carrying the display name; used when only a patch is at hand.
    const LABEL_FIELD: &'static str;

    /// Human-readable name embedded in activity descriptions.
    fn label(&self) -> String;

    /// File in blob storage that must be removed along with the record.
    fn stored_file(&self) -> Option<StoredFile> {
        None
    }

    /// Record where an uploaded file landed.
    fn attach_file(&mut self, _file: &StoredFile) {}
}
