//! Shifts and leave blocks shown on the roster calendar.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    #[default]
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

/// A rostered shift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    pub id: RecordId,
    pub staff_id: Option<RecordId>,
    pub staff_name: Option<String>,
    pub participant_id: Option<RecordId>,
    /// House the shift is worked at; `None` lands in the unassigned bucket
    pub house_id: Option<String>,
    pub house_name: Option<String>,
    pub shift_date: NaiveDate,
    /// Only set for shifts that finish on a later day
    pub end_date: Option<NaiveDate>,
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM"
    pub end_time: String,
    #[serde(default)]
    pub status: ShiftStatus,
}

impl Shift {
    pub fn is_cancelled(&self) -> bool {
        self.status == ShiftStatus::Cancelled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Declined,
}

/// A period a staff member is away.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveBlock {
    pub id: RecordId,
    pub staff_id: RecordId,
    pub staff_name: Option<String>,
    pub leave_type: String,
    pub start_date: NaiveDate,
    /// Inclusive
    pub end_date: NaiveDate,
    #[serde(default)]
    pub status: LeaveStatus,
}

impl LeaveBlock {
    /// Whether `date` falls inside `[start_date, end_date]`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}
