//! # Local Display Time
//!
//! Converts API timestamps (seconds since the UNIX epoch, always UTC) into the
//! wall-clock strings printed on the panel.
//!
//! The station runs on a fixed US Eastern approximation rather than a full
//! timezone database:
//! - **Daylight window**: second Sunday of March 00:00 UTC (inclusive) to the
//!   first Sunday of November 00:00 UTC (exclusive), in the UTC year of the
//!   instant
//! - **Offset**: −4 h inside the window, −5 h outside it
//!
//! Every string the model stores goes through this module; raw epoch values
//! never leave the extractor.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use serde_json::Value;
use thiserror::Error;

/// Offset applied inside the daylight window.
const DAYLIGHT_OFFSET_HOURS: i32 = -4;
/// Offset applied outside the daylight window.
const STANDARD_OFFSET_HOURS: i32 = -5;

/// Errors raised while interpreting a timestamp.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimeError {
    /// The value is not an integer count of seconds, or falls outside the
    /// range chrono can represent.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

/// Read an epoch-seconds value from an untrusted JSON node.
///
/// Accepts integers, strings holding an integer, and floats without a
/// fractional part.
pub fn epoch_from_json(value: &Value) -> Result<i64, TimeError> {
    let invalid = || TimeError::InvalidTimestamp(value.to_string());
    match value {
        Value::Number(n) => {
            if let Some(secs) = n.as_i64() {
                return Ok(secs);
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(f as i64)
                }
                _ => Err(invalid()),
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Start (inclusive) and end (exclusive) of the daylight window for `year`.
///
/// Returns `None` only for years chrono cannot represent.
pub fn dst_window(year: i32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = NaiveDate::from_weekday_of_month_opt(year, 3, Weekday::Sun, 2)?;
    let end = NaiveDate::from_weekday_of_month_opt(year, 11, Weekday::Sun, 1)?;
    Some((
        Utc.from_utc_datetime(&start.and_hms_opt(0, 0, 0)?),
        Utc.from_utc_datetime(&end.and_hms_opt(0, 0, 0)?),
    ))
}

fn utc_instant(epoch_seconds: i64) -> Result<DateTime<Utc>, TimeError> {
    DateTime::from_timestamp(epoch_seconds, 0)
        .ok_or_else(|| TimeError::InvalidTimestamp(epoch_seconds.to_string()))
}

/// Hours to add to UTC for the given instant: −4 or −5.
pub fn utc_offset_hours(epoch_seconds: i64) -> Result<i32, TimeError> {
    let utc = utc_instant(epoch_seconds)?;
    let in_daylight = dst_window(utc.year())
        .map(|(start, end)| start <= utc && utc < end)
        .unwrap_or(false);

    Ok(if in_daylight {
        DAYLIGHT_OFFSET_HOURS
    } else {
        STANDARD_OFFSET_HOURS
    })
}

/// Local wall-clock time for an instant, as a naive date-time.
pub fn local_datetime(epoch_seconds: i64) -> Result<NaiveDateTime, TimeError> {
    let utc = utc_instant(epoch_seconds)?;
    let offset = utc_offset_hours(epoch_seconds)?;
    utc.naive_utc()
        .checked_add_signed(Duration::hours(offset as i64))
        .ok_or_else(|| TimeError::InvalidTimestamp(epoch_seconds.to_string()))
}

/// 12-hour clock time, e.g. `07:05 PM`.
pub fn to_local_display_time(epoch_seconds: i64) -> Result<String, TimeError> {
    Ok(local_datetime(epoch_seconds)?.format("%I:%M %p").to_string())
}

/// Date and 12-hour clock time for the header, e.g. `10/19/2026 03:05 PM`.
pub fn to_local_date_time(epoch_seconds: i64) -> Result<String, TimeError> {
    Ok(local_datetime(epoch_seconds)?
        .format("%m/%d/%Y %I:%M %p")
        .to_string())
}

/// Abbreviated local weekday, e.g. `Mon`.
pub fn to_local_weekday(epoch_seconds: i64) -> Result<String, TimeError> {
    Ok(local_datetime(epoch_seconds)?.format("%a").to_string())
}
