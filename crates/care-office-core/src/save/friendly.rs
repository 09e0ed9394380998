//! Mapping of store errors to user-facing messages.

use crate::store::{RemoteError, StoreError};

/// Toast content for a failed save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendlyError {
    pub title: String,
    pub description: String,
}

impl FriendlyError {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Column named in a Postgres `Key (col)=(value)` detail.
fn key_column(details: &str) -> Option<&str> {
    let start = details.find("Key (")? + "Key (".len();
    let end = details[start..].find(')')? + start;
    Some(&details[start..end])
}

/// Column named in a `null value in column "col"` message.
fn quoted_column(message: &str) -> Option<&str> {
    let start = message.find("column \"")? + "column \"".len();
    let end = message[start..].find('"')? + start;
    Some(&message[start..end])
}

/// Column named in a SQLite `... constraint failed: table.col` message.
fn sqlite_column(message: &str) -> Option<&str> {
    let (_, columns) = message.split_once("constraint failed: ")?;
    let first = columns.split(',').next()?.trim();
    Some(first.rsplit('.').next().unwrap_or(first))
}

fn humanize(column: &str) -> String {
    let spaced = column.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => spaced,
    }
}

fn parse_remote(remote: &RemoteError) -> FriendlyError {
    let column = || {
        remote
            .details
            .as_deref()
            .and_then(key_column)
            .or_else(|| quoted_column(&remote.message))
            .or_else(|| sqlite_column(&remote.message))
    };

    match remote.code.as_deref() {
        Some("23505") => match column() {
            Some(col) => FriendlyError::new(
                "Duplicate entry",
                format!("A record with this {} already exists.", humanize(col).to_lowercase()),
            ),
            None => FriendlyError::new("Duplicate entry", "This record already exists."),
        },
        Some("23502") => match column() {
            Some(col) => FriendlyError::new(
                "Missing required field",
                format!("{} is required.", humanize(col)),
            ),
            None => FriendlyError::new("Missing required field", remote.message.clone()),
        },
        Some("23503") => FriendlyError::new(
            "Related record not found",
            "This record refers to something that no longer exists.",
        ),
        Some("22P02") | Some("22007") | Some("22008") => {
            FriendlyError::new("Invalid value", remote.message.clone())
        }
        _ => FriendlyError::new("Error saving changes", remote.message.clone()),
    }
}

/// Classify a store error into a toast title and description.
pub fn parse_store_error(err: &StoreError) -> FriendlyError {
    match err {
        StoreError::Remote(remote) => parse_remote(remote),
        StoreError::NotFound { .. } => FriendlyError::new(
            "Record not found",
            "It may have been deleted by someone else. Reload the page and try again.",
        ),
        StoreError::FileNotFound { path, .. } => {
            FriendlyError::new("File not found", format!("{} no longer exists.", path))
        }
        other => FriendlyError::new("Error saving changes", other.to_string()),
    }
}
