use super::EnrollmentWindow;
use super::duration::{FreeText, ParseDuration, ParseFailure};
use super::end_date::{add_duration, compute_end_date_with};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Upcoming,
    Completed,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Upcoming => "upcoming",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a status fell back to `Upcoming` without a closed window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indeterminate {
    MissingStartDate,
    IndeterminateWindow(Option<ParseFailure>),
    /// The duration parsed but the end date falls outside chrono's range.
    EndOutOfRange,
}

impl fmt::Display for Indeterminate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingStartDate => f.write_str("missing start date"),
            Self::IndeterminateWindow(None) => f.write_str("missing duration"),
            Self::IndeterminateWindow(Some(failure)) => {
                write!(f, "unreadable duration: {}", failure)
            }
            Self::EndOutOfRange => f.write_str("end date out of range"),
        }
    }
}

fn reason_text<S: serde::Serializer>(
    reason: &Option<Indeterminate>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match reason {
        Some(r) => serializer.serialize_some(&r.to_string()),
        None => serializer.serialize_none(),
    }
}

/// Status plus the facts it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Assessment {
    pub status: EnrollmentStatus,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(serialize_with = "reason_text")]
    pub reason: Option<Indeterminate>,
}

impl Assessment {
    fn unknown(reason: Indeterminate) -> Self {
        Self {
            status: EnrollmentStatus::Upcoming,
            end_date: None,
            reason: Some(reason),
        }
    }

    /// True when `Upcoming` means "not enough data" rather than "not started".
    pub fn is_indeterminate(&self) -> bool {
        self.reason.is_some()
    }
}

/// Classifies enrollment windows against a single evaluation instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier<P = FreeText> {
    parser: P,
}

impl<P: ParseDuration> Classifier<P> {
    pub fn new(parser: P) -> Self {
        Self { parser }
    }

    pub fn end_date(&self, start: DateTime<Utc>, duration: &str) -> Option<DateTime<Utc>> {
        compute_end_date_with(&self.parser, start, duration)
    }

    pub fn assess(&self, window: &EnrollmentWindow, now: DateTime<Utc>) -> Assessment {
        let Some(start) = window.start_date else {
            return Assessment::unknown(Indeterminate::MissingStartDate);
        };

        let parsed = match window.duration.as_deref() {
            Some(text) => self.parser.parse(text),
            None => {
                return Assessment::unknown(Indeterminate::IndeterminateWindow(None));
            }
        };
        let end = match parsed {
            Ok(d) => add_duration(start, d),
            Err(failure) => {
                return Assessment::unknown(Indeterminate::IndeterminateWindow(Some(failure)));
            }
        };
        let Some(end) = end else {
            return Assessment::unknown(Indeterminate::EndOutOfRange);
        };

        let status = if now < start {
            EnrollmentStatus::Upcoming
        } else if now > end {
            EnrollmentStatus::Completed
        } else {
            EnrollmentStatus::Active
        };

        Assessment {
            status,
            end_date: Some(end),
            reason: None,
        }
    }

    pub fn classify(&self, window: &EnrollmentWindow, now: DateTime<Utc>) -> EnrollmentStatus {
        self.assess(window, now).status
    }
}

pub fn assess(window: &EnrollmentWindow, now: DateTime<Utc>) -> Assessment {
    Classifier::<FreeText>::default().assess(window, now)
}

/// Missing or unreadable data maps to `Upcoming`; see [`assess`] to tell
/// those cases apart from windows that genuinely haven't started.
pub fn classify(window: &EnrollmentWindow, now: DateTime<Utc>) -> EnrollmentStatus {
    assess(window, now).status
}

/// Per-status counts for the statistics cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub total: usize,
    pub active: usize,
    pub upcoming: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: EnrollmentStatus) {
        self.total += 1;
        match status {
            EnrollmentStatus::Active => self.active += 1,
            EnrollmentStatus::Upcoming => self.upcoming += 1,
            EnrollmentStatus::Completed => self.completed += 1,
        }
    }

    pub fn tally<'a, I>(windows: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a EnrollmentWindow>,
    {
        let mut counts = Self::default();
        for window in windows {
            counts.record(classify(window, now));
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::parse_date;

    fn date(s: &str) -> DateTime<Utc> {
        parse_date(s).unwrap()
    }

    fn window(start: Option<&str>, duration: Option<&str>) -> EnrollmentWindow {
        EnrollmentWindow {
            start_date: start.map(date),
            duration: duration.map(str::to_string),
        }
    }

    #[test]
    fn test_two_week_scenario() {
        let w = window(Some("2025-01-01"), Some("2 weeks"));
        let a = assess(&w, date("2025-01-10"));
        assert_eq!(a.status, EnrollmentStatus::Active);
        assert_eq!(a.end_date, Some(date("2025-01-15")));

        assert_eq!(classify(&w, date("2025-01-20")), EnrollmentStatus::Completed);
        assert_eq!(classify(&w, date("2024-12-25")), EnrollmentStatus::Upcoming);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let w = window(Some("2025-01-01"), Some("2 weeks"));
        assert_eq!(classify(&w, date("2025-01-01")), EnrollmentStatus::Active);
        assert_eq!(classify(&w, date("2025-01-15")), EnrollmentStatus::Active);
        assert_eq!(
            classify(&w, date("2025-01-15T00:00:01Z")),
            EnrollmentStatus::Completed
        );
    }

    #[test]
    fn test_zero_length_window_is_active_at_its_instant() {
        let w = window(Some("2025-03-03"), Some("0 days"));
        assert_eq!(classify(&w, date("2025-03-03")), EnrollmentStatus::Active);
    }

    #[test]
    fn test_missing_start_is_upcoming() {
        let a = assess(&window(None, Some("3 months")), date("2030-01-01"));
        assert_eq!(a.status, EnrollmentStatus::Upcoming);
        assert_eq!(a.reason, Some(Indeterminate::MissingStartDate));
        assert!(a.is_indeterminate());
    }

    #[test]
    fn test_missing_duration_is_indeterminate() {
        let a = assess(&window(Some("2020-01-01"), None), date("2030-01-01"));
        assert_eq!(a.status, EnrollmentStatus::Upcoming);
        assert_eq!(a.reason, Some(Indeterminate::IndeterminateWindow(None)));
        assert_eq!(a.end_date, None);
    }

    #[test]
    fn test_unparseable_duration_is_upcoming_even_long_after_start() {
        let a = assess(&window(Some("2020-01-01"), Some("flexible")), date("2030-01-01"));
        assert_eq!(a.status, EnrollmentStatus::Upcoming);
        assert_eq!(
            a.reason,
            Some(Indeterminate::IndeterminateWindow(Some(ParseFailure::NoMatch)))
        );
    }

    #[test]
    fn test_end_past_date_range_is_not_a_parse_failure() {
        let a = assess(
            &window(Some("2025-01-01"), Some("100000000 days")),
            date("2025-06-01"),
        );
        assert_eq!(a.status, EnrollmentStatus::Upcoming);
        assert_eq!(a.end_date, None);
        assert_eq!(a.reason, Some(Indeterminate::EndOutOfRange));
        assert_eq!(a.reason.unwrap().to_string(), "end date out of range");
    }

    #[test]
    fn test_genuinely_upcoming_has_no_reason() {
        let a = assess(&window(Some("2030-01-01"), Some("1 month")), date("2025-01-01"));
        assert_eq!(a.status, EnrollmentStatus::Upcoming);
        assert!(!a.is_indeterminate());
    }

    struct DaysOnly;

    impl ParseDuration for DaysOnly {
        fn parse(&self, input: &str) -> Result<crate::window::ParsedDuration, ParseFailure> {
            let amount = input.trim().parse().map_err(|_| ParseFailure::NoMatch)?;
            Ok(crate::window::ParsedDuration {
                amount,
                unit: crate::window::DurationUnit::Day,
            })
        }
    }

    #[test]
    fn test_custom_parser_plugs_into_classifier() {
        let classifier = Classifier::new(DaysOnly);
        let w = window(Some("2025-01-01"), Some("5"));
        assert_eq!(
            classifier.classify(&w, date("2025-01-07")),
            EnrollmentStatus::Completed
        );
        assert_eq!(
            classifier.end_date(date("2025-01-01"), "5"),
            Some(date("2025-01-06"))
        );
    }

    #[test]
    fn test_tally_counts_each_status() {
        let windows = vec![
            window(Some("2025-01-01"), Some("2 weeks")),
            window(Some("2024-01-01"), Some("1 month")),
            window(Some("2026-01-01"), Some("1 month")),
            window(None, None),
        ];
        let counts = StatusCounts::tally(&windows, date("2025-01-05"));
        assert_eq!(
            counts,
            StatusCounts {
                total: 4,
                active: 1,
                upcoming: 2,
                completed: 1,
            }
        );
    }
}
