// src/utils/date.rs

//! Post date extraction from topic titles.
//!
//! Topic titles open with a month/day pair and a parenthesized weekday,
//! e.g. `12/9 (Tue.) Topic Name`. The year is never written, so it is
//! resolved from the month's distance to the current month.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

static LEAD_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})\s*\([A-Za-z]+\.?\)").expect("lead-in pattern is valid")
});

/// Extract the post date from a title, relative to `today`.
///
/// Returns `None` when the title does not start with the date lead-in or
/// when the resolved triple is not a calendar date.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use forum_watch::utils::date::extract_post_date;
///
/// let today = NaiveDate::from_ymd_opt(2025, 12, 11).unwrap();
/// assert_eq!(
///     extract_post_date("12/9 (Tue.) Topic A", today),
///     NaiveDate::from_ymd_opt(2025, 12, 9)
/// );
/// assert_eq!(extract_post_date("bad title no date", today), None);
/// ```
pub fn extract_post_date(title: &str, today: NaiveDate) -> Option<NaiveDate> {
    let caps = LEAD_IN.captures(title)?;
    let month: u32 = caps.get(1)?.as_str().parse().ok()?;
    let day: u32 = caps.get(2)?.as_str().parse().ok()?;

    NaiveDate::from_ymd_opt(resolve_year(month, today), month, day)
}

/// Pick the year for a month seen on the listing.
///
/// More than six months behind the current month means next year, more
/// than six ahead means last year. The thresholds are strict, so in
/// January nothing is ever pushed into next year.
pub fn resolve_year(month: u32, today: NaiveDate) -> i32 {
    let month = month as i32;
    let current = today.month() as i32;

    if month < current - 6 {
        today.year() + 1
    } else if month > current + 6 {
        today.year() - 1
    } else {
        today.year()
    }
}
