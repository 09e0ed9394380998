//! Field-level diffs between form data and a persisted snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::models::{FieldChange, Fields};

/// Treat `null`, missing and empty strings as one blank value.
pub fn normalize(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(v) => Some(v),
    }
}

/// Whether a field counts as unset.
pub fn is_blank(value: Option<&Value>) -> bool {
    match normalize(value) {
        None => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

fn number_matches_text(n: &serde_json::Number, s: &str) -> bool {
    match (n.as_f64(), s.trim().parse::<f64>()) {
        (Some(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Compare two field values under the blank-equivalence rules.
pub fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (normalize(a), normalize(b)) {
        (None, None) => true,
        (None, Some(_)) | (Some(_), None) => false,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x.as_f64() == y.as_f64(),
        (Some(Value::Number(n)), Some(Value::String(s)))
        | (Some(Value::String(s)), Some(Value::Number(n))) => number_matches_text(n, s),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            if x == y {
                return true;
            }
            match (parse_datetime(x), parse_datetime(y)) {
                (Some(dx), Some(dy)) => dx == dy,
                _ => false,
            }
        }
        (Some(x), Some(y)) => x == y,
    }
}

/// Fields of `current` that differ from `baseline`, with blank values sent as `null`.
///
/// Only keys present in `current` are considered; the form never removes a column.
pub fn diff_fields(current: &Fields, baseline: &Fields) -> Fields {
    current
        .iter()
        .filter(|(key, value)| !values_equal(Some(*value), baseline.get(key.as_str())))
        .map(|(key, value)| {
            let value = normalize(Some(value)).cloned().unwrap_or(Value::Null);
            (key.clone(), value)
        })
        .collect()
}

/// Old/new pairs for every changed field between two snapshots, for the activity log.
pub fn change_summary(before: &Fields, after: &Fields) -> BTreeMap<String, FieldChange> {
    after
        .iter()
        .filter(|(key, value)| !values_equal(before.get(key.as_str()), Some(*value)))
        .map(|(key, value)| {
            let old = normalize(before.get(key)).cloned().unwrap_or(Value::Null);
            let new = normalize(Some(value)).cloned().unwrap_or(Value::Null);
            (key.clone(), FieldChange { old, new })
        })
        .collect()
}

/// Copy every patch field over `base`.
pub fn apply_patch(base: &mut Fields, patch: &Fields) {
    for (key, value) in patch {
        base.insert(key.clone(), value.clone());
    }
}
