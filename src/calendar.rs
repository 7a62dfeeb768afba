//! Calendar arithmetic: the week matrix of a month, bucketing events by day and the range of
//! months a user may navigate to.

use crate::model::Event;
use chrono::{Datelike, Months, NaiveDate, TimeZone};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Marks a grid cell that does not belong to the month.
pub const NO_DAY: u32 = 0;

pub const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Events of one displayed month, keyed by day of month.
pub type EventsByDay = BTreeMap<u32, Vec<Event>>;

/// English name of `month` (1-based). Out of range months have no name.
pub fn month_name(month: u32) -> &'static str {
    match month {
        1..=12 => MONTH_NAMES[month as usize - 1],
        _ => "",
    }
}

/// `YYYY-MM-DD`, the format of a date input.
pub fn format_date_html(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// The first day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Moves `date` to the first day of the month `delta` months away.
pub fn shift_month(date: NaiveDate, delta: i32) -> Option<NaiveDate> {
    let first = first_of_month(date);
    if delta >= 0 {
        first.checked_add_months(Months::new(delta.unsigned_abs()))
    } else {
        first.checked_sub_months(Months::new(delta.unsigned_abs()))
    }
}

/// The number of the last day of `month` in `year`, or `None` for an invalid month.
pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = first.checked_add_months(Months::new(1))?;
    next.pred_opt().map(|d| d.day())
}

/// The weeks of a month as rows of seven day numbers, Sunday first. Cells before the first and
/// after the last day hold [`NO_DAY`].
pub fn weeks_of_month(year: i32, month: u32) -> Vec<[u32; 7]> {
    let (first, last) = match (
        NaiveDate::from_ymd_opt(year, month, 1),
        last_day_of_month(year, month),
    ) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };

    let mut weeks = Vec::with_capacity(6);
    let mut week = [NO_DAY; 7];
    let mut col = first.weekday().num_days_from_sunday() as usize;
    for day in 1..=last {
        week[col] = day;
        col += 1;
        if col == 7 {
            weeks.push(week);
            week = [NO_DAY; 7];
            col = 0;
        }
    }
    if col > 0 {
        weeks.push(week);
    }
    weeks
}

/// Buckets the events of `month` in `year` by their day of month in `tz`. Events are first
/// ordered by type name descending, keeping fetch order otherwise. Events whose date cannot be
/// read, or that fall in another month in `tz`, are skipped.
pub fn group_by_day<Tz: TimeZone>(
    events: Vec<Event>,
    year: i32,
    month: u32,
    tz: &Tz,
) -> EventsByDay {
    let mut events = events;
    events.sort_by(|a, b| b.kind.as_str().cmp(a.kind.as_str()));

    let mut grouped = EventsByDay::new();
    for event in events {
        match event.date_in(tz) {
            Some(date) if date.year() == year && date.month() == month => {
                grouped.entry(date.day()).or_default().push(event)
            }
            Some(date) => debug!(
                "Skipping event '{}' on {date}, it is outside {year}-{month:02}",
                event.id
            ),
            None => warn!("Skipping event '{}' with unreadable date '{}'", event.id, event.date),
        }
    }
    grouped
}

/// How far from the current month the calendar may be navigated, in months.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MonthRange {
    limit: u32,
}

impl MonthRange {
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// The earliest month that may be displayed, given `today`.
    pub fn min(&self, today: NaiveDate) -> Option<NaiveDate> {
        shift_month(today, -i32::try_from(self.limit).ok()?)
    }

    /// The latest month that may be displayed, given `today`.
    pub fn max(&self, today: NaiveDate) -> Option<NaiveDate> {
        shift_month(today, i32::try_from(self.limit).ok()?)
    }

    /// Whether "previous month" is available while `displayed` is shown.
    pub fn allows_prev(&self, displayed: NaiveDate, today: NaiveDate) -> bool {
        match self.min(today) {
            Some(min) => first_of_month(displayed) > min,
            None => false,
        }
    }

    /// Whether "next month" is available while `displayed` is shown.
    pub fn allows_next(&self, displayed: NaiveDate, today: NaiveDate) -> bool {
        match self.max(today) {
            Some(max) => first_of_month(displayed) < max,
            None => false,
        }
    }
}
