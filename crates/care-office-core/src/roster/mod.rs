//! Roster calendar: shift durations, date ranges and the shift/leave overlay.

mod calendar;
mod duration;
mod load;
mod overlay;

pub use calendar::*;
pub use duration::*;
pub use load::*;
pub use overlay::*;

use thiserror::Error;

/// Roster errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RosterError {
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Shift ends before it starts: {0}")]
    NegativeDuration(String),
}

pub type RosterResult<T> = Result<T, RosterError>;
