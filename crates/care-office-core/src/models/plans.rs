//! Participant care plan sections: medications, goals, providers and shift notes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Section, SectionRecord};

/// A medication a participant takes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    /// Route of administration (e.g., "oral")
    pub route: Option<String>,
    pub prescriber: Option<String>,
    pub start_date: Option<NaiveDate>,
    /// Open ended when absent
    pub end_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl Medication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dosage: None,
            frequency: None,
            route: None,
            prescriber: None,
            start_date: None,
            end_date: None,
            notes: None,
        }
    }

    /// Whether the medication is being taken on `date`.
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        let started = self.start_date.map_or(true, |start| start <= date);
        let not_ended = self.end_date.map_or(true, |end| date <= end);
        started && not_ended
    }
}

impl SectionRecord for Medication {
    const SECTION: Section = Section::Medications;
    const LABEL_FIELD: &'static str = "name";

    fn label(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    #[default]
    NotStarted,
    InProgress,
    Achieved,
    Discontinued,
}

/// A participant goal from their support plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub status: GoalStatus,
    /// Percent complete, 0..=100
    #[serde(default)]
    pub progress: u8,
    pub target_date: Option<NaiveDate>,
}

impl Goal {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: GoalStatus::NotStarted,
            progress: 0,
            target_date: None,
        }
    }

    /// Set progress, clamping to 100.
    pub fn set_progress(&mut self, progress: u32) {
        self.progress = progress.min(100) as u8;
        if self.progress == 100 {
            self.status = GoalStatus::Achieved;
        } else if self.progress > 0 && self.status == GoalStatus::NotStarted {
            self.status = GoalStatus::InProgress;
        }
    }
}

impl SectionRecord for Goal {
    const SECTION: Section = Section::Goals;
    const LABEL_FIELD: &'static str = "title";

    fn label(&self) -> String {
        self.title.clone()
    }
}

/// An external provider delivering supports to a participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub name: String,
    pub service_type: Option<String>,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ServiceProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service_type: None,
            contact_name: None,
            phone: None,
            email: None,
        }
    }
}

impl SectionRecord for ServiceProvider {
    const SECTION: Section = Section::ServiceProviders;
    const LABEL_FIELD: &'static str = "name";

    fn label(&self) -> String {
        self.name.clone()
    }
}

/// Progress note written against a shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftNote {
    pub author: String,
    pub body: String,
    pub category: Option<String>,
}

impl ShiftNote {
    pub fn new(author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            category: None,
        }
    }
}

impl SectionRecord for ShiftNote {
    const SECTION: Section = Section::ShiftNotes;
    const LABEL_FIELD: &'static str = "author";

    fn label(&self) -> String {
        format!("note by {}", self.author)
    }
}
