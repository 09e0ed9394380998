//! Shift duration arithmetic.

use chrono::{NaiveDate, NaiveTime};

use super::{RosterError, RosterResult};
use crate::models::Shift;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Parse "HH:MM" or "HH:MM:SS".
pub fn parse_time(s: &str) -> RosterResult<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| RosterError::InvalidTime(s.to_string()))
}

/// Parse an ISO "YYYY-MM-DD" date.
pub fn parse_date(s: &str) -> RosterResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| RosterError::InvalidDate(s.to_string()))
}

fn round_hours(minutes: i64) -> f64 {
    (minutes as f64 / 60.0 * 100.0).round() / 100.0
}

/// Hours between a start and end time, rounded to two decimals.
///
/// When both dates are given and differ, the full datetime difference is
/// used, so multi-day shifts work. Otherwise an end time before the start
/// time is taken as an overnight shift and 24 hours are added.
pub fn calculate_duration(
    start_time: &str,
    end_time: &str,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> RosterResult<f64> {
    let start = parse_time(start_time)?;
    let end = parse_time(end_time)?;

    let dates = match (start_date, end_date) {
        (Some(sd), Some(ed)) if !sd.trim().is_empty() && !ed.trim().is_empty() => {
            Some((parse_date(sd)?, parse_date(ed)?))
        }
        _ => None,
    };

    let minutes = match dates {
        Some((sd, ed)) if sd != ed => {
            let minutes = (ed.and_time(end) - sd.and_time(start)).num_minutes();
            if minutes < 0 {
                return Err(RosterError::NegativeDuration(format!(
                    "{} {} to {} {}",
                    sd, start_time, ed, end_time
                )));
            }
            minutes
        }
        _ => {
            let minutes = (end - start).num_minutes();
            if minutes < 0 {
                minutes + MINUTES_PER_DAY
            } else {
                minutes
            }
        }
    };

    Ok(round_hours(minutes))
}

/// Rostered hours of a shift.
pub fn shift_hours(shift: &Shift) -> RosterResult<f64> {
    let start_date = shift.shift_date.to_string();
    let end_date = shift.end_date.map(|d| d.to_string());
    calculate_duration(
        &shift.start_time,
        &shift.end_time,
        Some(start_date.as_str()),
        end_date.as_deref().or(Some(start_date.as_str())),
    )
}

/// Total hours across shifts, skipping cancelled ones.
pub fn total_hours<'a>(shifts: impl IntoIterator<Item = &'a Shift>) -> RosterResult<f64> {
    let mut minutes = 0.0;
    for shift in shifts.into_iter().filter(|s| !s.is_cancelled()) {
        minutes += shift_hours(shift)? * 60.0;
    }
    Ok((minutes / 60.0 * 100.0).round() / 100.0)
}
