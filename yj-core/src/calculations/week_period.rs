//! Business-week boundary resolution.
//!
//! A business week runs Friday to Friday. The canonical convention,
//! applied uniformly to range queries, persisted columns and report
//! text, is:
//!
//! * the timestamp window is half-open: `[week_start 00:00,
//!   week_start + 7 days 00:00)`;
//! * the persisted `week_end` date is the last *covered* calendar day,
//!   `week_start + 6 days` (the Thursday).
//!
//! Those are the same rule in two representations: a Thursday 23:59:59
//! sale belongs to the week, a Friday 00:00:00 sale opens the next one.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Returns the Friday that begins the business week containing `date`.
///
/// A Friday maps to itself; every other weekday rolls back to the most
/// recent Friday. Idempotent.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use yj_core::calculations::week_period::week_start_for;
///
/// // Monday 2024-11-18 belongs to the week opened Friday 2024-11-15.
/// let monday = NaiveDate::from_ymd_opt(2024, 11, 18).unwrap();
/// let friday = NaiveDate::from_ymd_opt(2024, 11, 15).unwrap();
/// assert_eq!(week_start_for(monday), friday);
/// assert_eq!(week_start_for(friday), friday);
/// ```
pub fn week_start_for(date: NaiveDate) -> NaiveDate {
    let days_since_friday = (date.weekday().num_days_from_monday() + 7
        - Weekday::Fri.num_days_from_monday())
        % 7;
    date - Duration::days(i64::from(days_since_friday))
}

/// Last calendar day covered by the week: `week_start + 6` (Thursday).
pub fn week_end_for(week_start: NaiveDate) -> NaiveDate {
    week_start + Duration::days(6)
}

/// The half-open timestamp window for fact aggregation:
/// `[week_start 00:00, week_start + 7 days 00:00)`.
pub fn week_window(week_start: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    (
        week_start.and_time(NaiveTime::MIN),
        (week_start + Duration::days(7)).and_time(NaiveTime::MIN),
    )
}

/// True iff `date` falls on one of the seven days the week covers.
pub fn contains(week_start: NaiveDate, date: NaiveDate) -> bool {
    week_start <= date && date <= week_end_for(week_start)
}
