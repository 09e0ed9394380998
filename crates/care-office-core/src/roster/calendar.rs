//! Calendar ranges for the roster views.

use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// Roster view granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarView {
    Day,
    Week,
    Month,
}

/// First day of the week containing `date`.
pub fn start_of_week(date: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset = (date.weekday().num_days_from_monday() + 7
        - week_start.num_days_from_monday())
        % 7;
    date - Days::new(u64::from(offset))
}

/// Dates of every cell shown for `view` around `anchor`.
pub fn date_range(view: CalendarView, anchor: NaiveDate, week_start: Weekday) -> Vec<NaiveDate> {
    match view {
        CalendarView::Day => vec![anchor],
        CalendarView::Week => start_of_week(anchor, week_start)
            .iter_days()
            .take(7)
            .collect(),
        CalendarView::Month => {
            let first = anchor.with_day(1).unwrap_or(anchor);
            first
                .iter_days()
                .take_while(|d| d.month() == anchor.month())
                .collect()
        }
    }
}

/// Move the anchor forward (positive) or back (negative) by whole views.
pub fn step_anchor(view: CalendarView, anchor: NaiveDate, steps: i32) -> Option<NaiveDate> {
    let magnitude = steps.unsigned_abs();
    match view {
        CalendarView::Day | CalendarView::Week => {
            let days = Days::new(u64::from(magnitude) * if view == CalendarView::Day { 1 } else { 7 });
            if steps >= 0 {
                anchor.checked_add_days(days)
            } else {
                anchor.checked_sub_days(days)
            }
        }
        CalendarView::Month => {
            let months = Months::new(magnitude);
            if steps >= 0 {
                anchor.checked_add_months(months)
            } else {
                anchor.checked_sub_months(months)
            }
        }
    }
}
