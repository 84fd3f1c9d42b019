use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::error::ValidationError;
use crate::shift::{ShiftPattern, ShiftType};

/// One row of a day-by-day shift preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayPreview {
    pub date: NaiveDate,
    pub shift: ShiftType,
    /// English weekday name, e.g. "Monday".
    pub weekday_name: &'static str,
    /// Short date, e.g. "Jan 5".
    pub date_label: String,
    pub is_today: bool,
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Exactly `days` consecutive entries starting at `today`.
///
/// # Errors
/// Returns [`ValidationError::NegativeDays`] if `days` is negative.
pub fn build_preview(
    pattern: &ShiftPattern,
    today: NaiveDate,
    days: i64,
) -> Result<Vec<DayPreview>, ValidationError> {
    if days < 0 {
        return Err(ValidationError::NegativeDays {
            field: "days_ahead",
            value: days,
        });
    }

    Ok(today
        .iter_days()
        .take(days as usize)
        .map(|date| DayPreview {
            date,
            shift: pattern.shift_for_date(date),
            weekday_name: weekday_name(date.weekday()),
            date_label: date.format("%b %-d").to_string(),
            is_today: date == today,
        })
        .collect())
}
