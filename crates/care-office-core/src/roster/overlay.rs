//! Shift and leave overlay for roster calendar cells.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveTime};

use crate::config::RosterConfig;
use crate::models::{LeaveBlock, LeaveStatus, RecordId, Shift};

use super::parse_time;

/// How shifts inside a cell are bucketed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    /// No location grouping
    All,
    House(String),
    Unassigned,
}

/// Shifts of one cell sharing a location.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationGroup<'a> {
    pub key: GroupKey,
    pub label: String,
    /// Ordered by start time
    pub shifts: Vec<&'a Shift>,
}

/// One calendar cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarCell<'a> {
    pub date: NaiveDate,
    pub groups: Vec<LocationGroup<'a>>,
    /// Leave blocks covering this date
    pub leave: Vec<&'a LeaveBlock>,
}

impl CalendarCell<'_> {
    pub fn shift_count(&self) -> usize {
        self.groups.iter().map(|g| g.shifts.len()).sum()
    }
}

#[derive(Debug, Clone)]
pub struct OverlayOptions {
    pub group_by_location: bool,
    pub unassigned_label: String,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            group_by_location: false,
            unassigned_label: "Unassigned".to_string(),
        }
    }
}

impl OverlayOptions {
    pub fn from_config(config: &RosterConfig, group_by_location: bool) -> Self {
        Self {
            group_by_location,
            unassigned_label: config.unassigned_label.clone(),
        }
    }
}

/// Calendar cells plus the warnings the roster highlights.
#[derive(Debug, Clone, PartialEq)]
pub struct RosterOverlay<'a> {
    pub cells: Vec<CalendarCell<'a>>,
    /// Shifts double-booking a staff member on the same day
    pub collisions: BTreeSet<RecordId>,
    /// Shifts rostered to a staff member on approved leave
    pub leave_conflicts: BTreeSet<RecordId>,
}

/// Ids of non-cancelled shifts sharing a staff member and a day with another one.
pub fn find_collisions(shifts: &[Shift]) -> BTreeSet<RecordId> {
    let mut by_staff_day: BTreeMap<(&RecordId, NaiveDate), Vec<&RecordId>> = BTreeMap::new();
    for shift in shifts.iter().filter(|s| !s.is_cancelled()) {
        if let Some(staff_id) = &shift.staff_id {
            by_staff_day
                .entry((staff_id, shift.shift_date))
                .or_default()
                .push(&shift.id);
        }
    }
    by_staff_day
        .into_values()
        .filter(|ids| ids.len() > 1)
        .flatten()
        .cloned()
        .collect()
}

/// Ids of non-cancelled shifts falling inside an approved leave block of their staff member.
pub fn find_leave_conflicts(shifts: &[Shift], leave: &[LeaveBlock]) -> BTreeSet<RecordId> {
    shifts
        .iter()
        .filter(|s| !s.is_cancelled())
        .filter(|shift| {
            leave.iter().any(|block| {
                block.status == LeaveStatus::Approved
                    && Some(&block.staff_id) == shift.staff_id.as_ref()
                    && block.covers(shift.shift_date)
            })
        })
        .map(|s| s.id.clone())
        .collect()
}

fn group_shifts<'a>(shifts: Vec<&'a Shift>, options: &OverlayOptions) -> Vec<LocationGroup<'a>> {
    if !options.group_by_location {
        if shifts.is_empty() {
            return Vec::new();
        }
        return vec![LocationGroup {
            key: GroupKey::All,
            label: String::new(),
            shifts,
        }];
    }

    let mut houses: Vec<LocationGroup<'a>> = Vec::new();
    let mut unassigned = Vec::new();
    for shift in shifts {
        match &shift.house_id {
            None => unassigned.push(shift),
            Some(house_id) => match houses
                .iter_mut()
                .find(|g| g.key == GroupKey::House(house_id.clone()))
            {
                Some(group) => group.shifts.push(shift),
                None => houses.push(LocationGroup {
                    key: GroupKey::House(house_id.clone()),
                    label: shift.house_name.clone().unwrap_or_else(|| house_id.clone()),
                    shifts: vec![shift],
                }),
            },
        }
    }
    if !unassigned.is_empty() {
        houses.push(LocationGroup {
            key: GroupKey::Unassigned,
            label: options.unassigned_label.clone(),
            shifts: unassigned,
        });
    }
    houses
}

/// Sort key by clock time; unparseable start times go last, in text order.
fn start_key(shift: &Shift) -> (bool, Option<NaiveTime>, String) {
    let time = parse_time(&shift.start_time).ok();
    (time.is_none(), time, shift.start_time.clone())
}

/// Lay shifts and leave over the given dates.
pub fn build_overlay<'a>(
    dates: &[NaiveDate],
    shifts: &'a [Shift],
    leave: &'a [LeaveBlock],
    options: &OverlayOptions,
) -> RosterOverlay<'a> {
    let cells = dates
        .iter()
        .map(|&date| {
            let mut day_shifts: Vec<&Shift> =
                shifts.iter().filter(|s| s.shift_date == date).collect();
            day_shifts.sort_by_cached_key(|s| start_key(s));
            CalendarCell {
                date,
                groups: group_shifts(day_shifts, options),
                leave: leave.iter().filter(|block| block.covers(date)).collect(),
            }
        })
        .collect();

    RosterOverlay {
        cells,
        collisions: find_collisions(shifts),
        leave_conflicts: find_leave_conflicts(shifts, leave),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShiftStatus;
    use crate::roster::{date_range, parse_date, CalendarView};
    use chrono::Weekday;

    fn shift(id: &str, staff: Option<&str>, date: &str, start: &str, house: Option<&str>) -> Shift {
        Shift {
            id: RecordId::new(id),
            staff_id: staff.map(RecordId::new),
            staff_name: None,
            participant_id: None,
            house_id: house.map(str::to_string),
            house_name: house.map(|h| format!("{} House", h)),
            shift_date: parse_date(date).unwrap(),
            end_date: None,
            start_time: start.to_string(),
            end_time: "23:00".to_string(),
            status: ShiftStatus::Scheduled,
        }
    }

    fn leave(staff: &str, start: &str, end: &str, status: LeaveStatus) -> LeaveBlock {
        LeaveBlock {
            id: RecordId::new(format!("leave-{}-{}", staff, start)),
            staff_id: RecordId::new(staff),
            staff_name: None,
            leave_type: "annual".into(),
            start_date: parse_date(start).unwrap(),
            end_date: parse_date(end).unwrap(),
            status,
        }
    }

    #[test]
    fn test_collisions_same_staff_same_day() {
        let mut cancelled = shift("c", Some("s1"), "2024-03-04", "18:00", None);
        cancelled.status = ShiftStatus::Cancelled;
        let shifts = vec![
            shift("a", Some("s1"), "2024-03-04", "07:00", None),
            shift("b", Some("s1"), "2024-03-04", "15:00", None),
            cancelled,
            shift("d", Some("s1"), "2024-03-05", "07:00", None),
            shift("e", None, "2024-03-04", "07:00", None),
            shift("f", None, "2024-03-04", "09:00", None),
        ];
        let collisions = find_collisions(&shifts);
        let ids: Vec<&str> = collisions.iter().map(RecordId::as_str).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_cancelled_shift_does_not_collide() {
        let mut cancelled = shift("b", Some("s1"), "2024-03-04", "15:00", None);
        cancelled.status = ShiftStatus::Cancelled;
        let shifts = vec![shift("a", Some("s1"), "2024-03-04", "07:00", None), cancelled];
        assert!(find_collisions(&shifts).is_empty());
    }

    #[test]
    fn test_leave_overlay_is_inclusive() {
        let dates = date_range(CalendarView::Week, parse_date("2024-03-04").unwrap(), Weekday::Mon);
        let blocks = vec![leave("s1", "2024-03-05", "2024-03-06", LeaveStatus::Approved)];
        let overlay = build_overlay(&dates, &[], &blocks, &OverlayOptions::default());

        let with_leave: Vec<NaiveDate> = overlay
            .cells
            .iter()
            .filter(|c| !c.leave.is_empty())
            .map(|c| c.date)
            .collect();
        assert_eq!(
            with_leave,
            vec![parse_date("2024-03-05").unwrap(), parse_date("2024-03-06").unwrap()]
        );
    }

    #[test]
    fn test_grouping_by_house_with_unassigned_last() {
        let shifts = vec![
            shift("a", Some("s1"), "2024-03-04", "15:00", None),
            shift("b", Some("s2"), "2024-03-04", "07:00", Some("elm")),
            shift("c", Some("s3"), "2024-03-04", "09:00", Some("oak")),
            shift("d", Some("s4"), "2024-03-04", "06:00", Some("oak")),
        ];
        let options = OverlayOptions {
            group_by_location: true,
            ..OverlayOptions::default()
        };
        let dates = vec![parse_date("2024-03-04").unwrap()];
        let overlay = build_overlay(&dates, &shifts, &[], &options);
        let cell = &overlay.cells[0];

        let labels: Vec<&str> = cell.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["oak House", "elm House", "Unassigned"]);
        assert_eq!(cell.groups[0].shifts[0].id.as_str(), "d");
        assert_eq!(cell.groups[2].key, GroupKey::Unassigned);
        assert_eq!(cell.shift_count(), 4);
    }

    #[test]
    fn test_shifts_sorted_by_clock_time() {
        let dates = vec![parse_date("2024-03-04").unwrap()];
        let shifts = vec![
            shift("late", Some("ana"), "2024-03-04", "10:00", None),
            shift("early", Some("ben"), "2024-03-04", "9:00", None),
            shift("odd", Some("cat"), "2024-03-04", "soon", None),
        ];
        let overlay = build_overlay(&dates, &shifts, &[], &OverlayOptions::default());
        let order: Vec<&str> = overlay.cells[0].groups[0]
            .shifts
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(order, vec!["early", "late", "odd"]);
    }

    #[test]
    fn test_ungrouped_cells() {
        let shifts = vec![
            shift("a", Some("s1"), "2024-03-04", "15:00", Some("oak")),
            shift("b", Some("s2"), "2024-03-05", "07:00", None),
        ];
        let dates = date_range(CalendarView::Day, parse_date("2024-03-04").unwrap(), Weekday::Mon);
        let overlay = build_overlay(&dates, &shifts, &[], &OverlayOptions::default());
        assert_eq!(overlay.cells.len(), 1);
        assert_eq!(overlay.cells[0].groups.len(), 1);
        assert_eq!(overlay.cells[0].groups[0].key, GroupKey::All);
        assert_eq!(overlay.cells[0].shift_count(), 1);
    }

    #[test]
    fn test_leave_conflicts_only_for_approved_leave() {
        let shifts = vec![
            shift("a", Some("s1"), "2024-03-05", "07:00", None),
            shift("b", Some("s2"), "2024-03-05", "07:00", None),
        ];
        let blocks = vec![
            leave("s1", "2024-03-04", "2024-03-05", LeaveStatus::Approved),
            leave("s2", "2024-03-05", "2024-03-05", LeaveStatus::Pending),
        ];
        let conflicts = find_leave_conflicts(&shifts, &blocks);
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts.contains(&RecordId::new("a")));
    }
}
