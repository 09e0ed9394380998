//! Emergency and family contacts.

use serde::{Deserialize, Serialize};

use super::{Section, SectionRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub relationship: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            relationship: None,
            phone: None,
            email: None,
            is_primary: false,
        }
    }
}

impl SectionRecord for Contact {
    const SECTION: Section = Section::Contacts;
    const LABEL_FIELD: &'static str = "name";

    fn label(&self) -> String {
        self.name.clone()
    }
}

/// True when more than one contact is marked primary.
pub fn has_multiple_primary<'a>(contacts: impl IntoIterator<Item = &'a Contact>) -> bool {
    contacts.into_iter().filter(|c| c.is_primary).count() > 1
}
