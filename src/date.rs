//! Day-key and calendar helpers
//!
//! The day key is the canonical `YYYY-MM-DD` grouping string used by every
//! daily count and range query. It is always derived from the *local*
//! calendar date, not UTC: a drink logged at 23:30 belongs to the day the
//! user experienced it.

use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, Utc};

/// Number of cells in the calendar month grid (6 weeks)
pub const MONTH_GRID_CELLS: usize = 42;

/// Derive the canonical day key for a timestamp, in local time.
pub fn day_key(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

/// Day key for "now".
pub fn today_key() -> String {
    day_key(Utc::now())
}

/// Day key for a plain calendar date.
pub fn day_key_of(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// First and last day keys of a calendar month, for inclusive range scans.
///
/// Returns `None` for an invalid month number.
pub fn month_bounds(year: i32, month: u32) -> Option<(String, String)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first
        .checked_add_months(Months::new(1))?
        .checked_sub_days(Days::new(1))?;
    Some((day_key_of(first), day_key_of(last)))
}

/// 42-cell month grid starting on the Monday of the week containing the
/// 1st, matching the calendar screen layout.
pub fn month_grid(year: i32, month: u32) -> Option<Vec<NaiveDate>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset = first.weekday().num_days_from_monday() as u64;
    let start = first.checked_sub_days(Days::new(offset))?;
    (0..MONTH_GRID_CELLS as u64)
        .map(|i| start.checked_add_days(Days::new(i)))
        .collect()
}

/// Wall-clock `HH:MM` for the day-detail event list.
pub fn format_time(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}
