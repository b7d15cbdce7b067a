//! Local time-of-day helpers.
//!
//! Opening hours and booked intervals are stored as wall-clock strings in the
//! agent's timezone. Arithmetic on them is done in whole minutes since local
//! midnight so that adding a duration can never wrap into the next day the way
//! `NaiveTime + Duration` does.

use chrono::{NaiveTime, Timelike};
use thiserror::Error;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid time of day '{0}', expected HH:MM")]
pub struct TimeOfDayError(pub String);

/// Parses `HH:MM` or `HH:MM:SS` into minutes since midnight.
///
/// `24:00` is accepted as the end of the day so a window can close at midnight.
/// A seconds field must be zero: every value lands exactly on a minute.
pub fn parse_minute_of_day(raw: &str) -> Result<u32, TimeOfDayError> {
    let trimmed = raw.trim();

    if trimmed == "24:00" || trimmed == "24:00:00" {
        return Ok(MINUTES_PER_DAY);
    }

    let time = NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| TimeOfDayError(raw.to_string()))?;

    if time.second() != 0 {
        return Err(TimeOfDayError(raw.to_string()));
    }

    Ok(minute_of_day(time))
}

pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Formats minutes since midnight as 24-hour `HH:MM`.
pub fn format_minute_of_day(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}
