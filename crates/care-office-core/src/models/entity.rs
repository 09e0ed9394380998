//! Parent entities that own a detail page.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Fields, Table};

/// Kind of record a detail page edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Staff,
    Participant,
    Shift,
}

impl EntityType {
    pub fn table(self) -> Table {
        match self {
            EntityType::Staff => Table::Staff,
            EntityType::Participant => Table::Participants,
            EntityType::Shift => Table::Shifts,
        }
    }

    /// Column on child records pointing back at the owner.
    pub fn foreign_key(self) -> &'static str {
        match self {
            EntityType::Staff => "staff_id",
            EntityType::Participant => "participant_id",
            EntityType::Shift => "shift_id",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Staff => "staff",
            EntityType::Participant => "participant",
            EntityType::Shift => "shift",
        }
    }

    /// Heading of the list page this entity belongs to.
    pub fn list_title(self) -> &'static str {
        match self {
            EntityType::Staff => "Staff",
            EntityType::Participant => "Participants",
            EntityType::Shift => "Roster",
        }
    }

    /// Display name of a record of this type, used for breadcrumbs and the activity log.
    pub fn display_name(self, fields: &Fields) -> String {
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::trim)
                .filter(|s| !s.is_empty())
        };

        match self {
            EntityType::Staff | EntityType::Participant => {
                let full = [text("first_name"), text("last_name")]
                    .into_iter()
                    .flatten()
                    .collect::<Vec<_>>()
                    .join(" ");
                if !full.is_empty() {
                    full
                } else {
                    text("name").unwrap_or("Unnamed").to_string()
                }
            }
            EntityType::Shift => match text("shift_date") {
                Some(date) => format!("Shift on {}", date),
                None => "Shift".to_string(),
            },
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "staff" => Ok(EntityType::Staff),
            "participant" => Ok(EntityType::Participant),
            "shift" => Ok(EntityType::Shift),
            _ => Err(format!("Unknown entity type: {}", s)),
        }
    }
}
