//! Enrollment window calculation: free-text duration parsing, end-date
//! arithmetic and status classification relative to a caller-supplied `now`.
//!
//! Everything here is pure. Missing or unreadable data never errors; it
//! degrades to an unknown end date and an `upcoming` status.

pub mod duration;
pub mod end_date;
pub mod status;

pub use duration::{DurationUnit, FreeText, ParseDuration, ParseFailure, ParsedDuration, parse_duration};
pub use end_date::{add_duration, compute_end_date, compute_end_date_with};
pub use status::{
    Assessment, Classifier, EnrollmentStatus, Indeterminate, StatusCounts, assess, classify,
};

use crate::error::WindowError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// The two fields of an enrollment record the calculator reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentWindow {
    pub start_date: Option<DateTime<Utc>>,
    pub duration: Option<String>,
}

impl EnrollmentWindow {
    pub fn new(start_date: Option<DateTime<Utc>>, duration: Option<String>) -> Self {
        Self {
            start_date,
            duration,
        }
    }
}

/// Parse an ISO-8601 date or timestamp. Plain dates are midnight UTC and
/// zone-less timestamps are read as UTC.
pub fn parse_date(input: &str) -> Result<DateTime<Utc>, WindowError> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    Err(WindowError::InvalidStartDate(input.to_string()))
}
