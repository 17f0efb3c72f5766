//! Calendar-day helpers shared by the scheduled jobs.
//!
//! All values are UTC calendar dates. A group whose members live in other
//! timezones sees the UTC day boundary, not their local one.

use chrono::{Datelike, NaiveDate, Utc};

/// ISO weekday number of a date: 1 = Monday .. 7 = Sunday.
pub fn iso_weekday(date: NaiveDate) -> u8 {
    date.weekday().number_from_monday() as u8
}

/// Current UTC calendar date.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// The UTC calendar date before `date`, saturating at the earliest representable date.
pub fn day_before(date: NaiveDate) -> NaiveDate {
    date.pred_opt().unwrap_or(date)
}

/// Every date from `start` to `end`, both inclusive. Empty when `end < start`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

/// The seven-day window that ends the day before `date`.
///
/// A recap generated on a Monday covers the previous Monday through Sunday.
pub fn week_before(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let end = day_before(date);
    let start = end
        .checked_sub_days(chrono::Days::new(6))
        .unwrap_or(NaiveDate::MIN);
    (start, end)
}
