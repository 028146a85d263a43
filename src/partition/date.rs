//! Embedded Timestamp Extraction
//!
//! Finds a `YYYY-MM-DD-HH` stamp inside a filename and parses it into an
//! hour-precision timestamp. Only the first stamp in the name is considered.

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// ASCII digits only: `\d` would also accept other Unicode digit classes.
static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9]{4})-([0-9]{2})-([0-9]{2})-([0-9]{2})")
        .expect("date pattern is a valid regex")
});

/// Why a filename did not yield a timestamp
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateError {
    /// No `YYYY-MM-DD-HH` substring in the filename
    #[error("date not found in string: {0}")]
    NotFound(String),
    /// The stamp was found but is not a real calendar date/hour
    #[error("failed to parse date string {stamp} in {filename}")]
    Invalid { filename: String, stamp: String },
}

/// Extract the first embedded timestamp from `filename`.
pub fn extract_timestamp(filename: &str) -> Result<NaiveDateTime, DateError> {
    let caps = DATE_PATTERN
        .captures(filename)
        .ok_or_else(|| DateError::NotFound(filename.to_string()))?;

    let invalid = || DateError::Invalid {
        filename: filename.to_string(),
        stamp: caps[0].to_string(),
    };

    // Groups are fixed-width ASCII digits, so the numeric parses cannot fail
    // except through overflow, which the widths rule out.
    let year: i32 = caps[1].parse().map_err(|_| invalid())?;
    let month: u32 = caps[2].parse().map_err(|_| invalid())?;
    let day: u32 = caps[3].parse().map_err(|_| invalid())?;
    let hour: u32 = caps[4].parse().map_err(|_| invalid())?;

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, 0, 0))
        .ok_or_else(invalid)
}
