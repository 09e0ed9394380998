//! Fetching the shifts and leave visible in a calendar range.

use chrono::NaiveDate;
use serde_json::Value;

use crate::models::{LeaveBlock, Shift, Table};
use crate::store::{Filter, Order, RemoteStore, StoreResult};

/// Shifts starting inside `from..=to`, by date.
pub fn load_shifts<S: RemoteStore + ?Sized>(
    store: &S,
    from: NaiveDate,
    to: NaiveDate,
) -> StoreResult<Vec<Shift>> {
    let rows = store.query(
        Table::Shifts,
        &[
            Filter::gte("shift_date", from.to_string()),
            Filter::lte("shift_date", to.to_string()),
        ],
        Some(&Order::asc("shift_date")),
    )?;
    rows.into_iter()
        .map(|row| Ok(serde_json::from_value(Value::Object(row))?))
        .collect()
}

/// Leave blocks overlapping `from..=to`.
pub fn load_leave<S: RemoteStore + ?Sized>(
    store: &S,
    from: NaiveDate,
    to: NaiveDate,
) -> StoreResult<Vec<LeaveBlock>> {
    let rows = store.query(
        Table::LeaveBlocks,
        &[
            Filter::lte("start_date", to.to_string()),
            Filter::gte("end_date", from.to_string()),
        ],
        Some(&Order::asc("start_date")),
    )?;
    rows.into_iter()
        .map(|row| Ok(serde_json::from_value(Value::Object(row))?))
        .collect()
}
