use super::duration::{DurationUnit, FreeText, ParseDuration, ParsedDuration};
use chrono::{DateTime, Days, Months, Utc};

/// Add a parsed duration to `start`.
///
/// Month and year steps use calendar arithmetic and clamp to the last valid
/// day of the target month: Jan 31 + 1 month is Feb 29 in a leap year (Feb 28
/// otherwise), Feb 29 + 1 year is Feb 28. Returns `None` only when the result
/// falls outside the representable date range.
pub fn add_duration(start: DateTime<Utc>, duration: ParsedDuration) -> Option<DateTime<Utc>> {
    let amount = duration.amount;
    match duration.unit {
        DurationUnit::Day => start.checked_add_days(Days::new(u64::from(amount))),
        DurationUnit::Week => start.checked_add_days(Days::new(u64::from(amount) * 7)),
        DurationUnit::Month => start.checked_add_months(Months::new(amount)),
        DurationUnit::Year => start.checked_add_months(Months::new(amount.checked_mul(12)?)),
    }
}

/// End of the enrollment window, or `None` when the duration text can't be read.
pub fn compute_end_date(start: DateTime<Utc>, duration: &str) -> Option<DateTime<Utc>> {
    compute_end_date_with(&FreeText, start, duration)
}

pub fn compute_end_date_with<P: ParseDuration + ?Sized>(
    parser: &P,
    start: DateTime<Utc>,
    duration: &str,
) -> Option<DateTime<Utc>> {
    let parsed = parser.parse(duration).ok()?;
    add_duration(start, parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::parse_date;

    fn date(s: &str) -> DateTime<Utc> {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_days_and_weeks() {
        assert_eq!(
            compute_end_date(date("2025-01-01"), "10 days"),
            Some(date("2025-01-11"))
        );
        assert_eq!(
            compute_end_date(date("2025-01-01"), "2 weeks"),
            Some(date("2025-01-15"))
        );
    }

    #[test]
    fn test_month_rolls_over_year() {
        assert_eq!(
            compute_end_date(date("2023-10-01"), "3 months"),
            Some(date("2024-01-01"))
        );
    }

    #[test]
    fn test_month_end_clamps_to_last_day() {
        assert_eq!(
            compute_end_date(date("2024-01-31"), "1 month"),
            Some(date("2024-02-29"))
        );
        assert_eq!(
            compute_end_date(date("2023-01-31"), "1 month"),
            Some(date("2023-02-28"))
        );
    }

    #[test]
    fn test_leap_day_plus_year_clamps() {
        assert_eq!(
            compute_end_date(date("2024-02-29"), "1 year"),
            Some(date("2025-02-28"))
        );
        assert_eq!(
            compute_end_date(date("2024-02-29"), "4 years"),
            Some(date("2028-02-29"))
        );
    }

    #[test]
    fn test_time_of_day_is_preserved() {
        assert_eq!(
            compute_end_date(date("2025-03-10T09:30:00Z"), "1 week"),
            Some(date("2025-03-17T09:30:00Z"))
        );
    }

    #[test]
    fn test_unparseable_duration_is_none() {
        assert_eq!(compute_end_date(date("2025-01-01"), "a while"), None);
        assert_eq!(compute_end_date(date("2025-01-01"), "1.5 months"), None);
    }

    #[test]
    fn test_out_of_range_is_none() {
        assert_eq!(compute_end_date(date("2025-01-01"), "4000000000 years"), None);
    }

    #[test]
    fn test_zero_duration_is_start() {
        let start = date("2025-06-01");
        assert_eq!(compute_end_date(start, "0 days"), Some(start));
    }
}
