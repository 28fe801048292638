//! Week and month date windows.
//!
//! # Invariants
//! - The week window is exactly 7 consecutive days starting at `today`, or
//!   an error when that span leaves chrono's date range.
//! - Month windows follow chrono's Gregorian calendar.
//! - Month windows are limited to four-digit years so their ISO text sorts
//!   chronologically in storage.

use crate::model::task::{ensure_supported_year, TaskValidationError};
use chrono::{Datelike, Days, NaiveDate};

/// Number of days shown by the week view.
pub const WEEK_LEN: usize = 7;

/// Returns `today` followed by the next six days.
///
/// Month and year boundaries are crossed by plain date arithmetic.
pub fn week_window(today: NaiveDate) -> Result<[NaiveDate; WEEK_LEN], TaskValidationError> {
    let mut days = [today; WEEK_LEN];
    for (offset, slot) in days.iter_mut().enumerate() {
        *slot = today
            .checked_add_days(Days::new(offset as u64))
            .ok_or(TaskValidationError::DateOutOfRange(today))?;
    }
    Ok(days)
}

/// Returns every day of `month` in `year`, ascending.
pub fn month_window(year: i32, month: u32) -> Result<Vec<NaiveDate>, TaskValidationError> {
    let (first, last) = month_bounds(year, month)?;
    Ok(first.iter_days().take_while(|day| *day <= last).collect())
}

/// Returns the first and last day of `month` in `year`.
pub fn month_bounds(year: i32, month: u32) -> Result<(NaiveDate, NaiveDate), TaskValidationError> {
    if !(1..=12).contains(&month) {
        return Err(TaskValidationError::InvalidMonth(month));
    }
    ensure_supported_year(year)?;

    let first =
        NaiveDate::from_ymd_opt(year, month, 1).ok_or(TaskValidationError::InvalidYear(year))?;
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first_of_next| first_of_next.pred_opt())
        .ok_or(TaskValidationError::InvalidYear(year))?;
    Ok((first, last))
}

/// Returns `(year, month)` of the month containing `date`.
pub fn month_of(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}
