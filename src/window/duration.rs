//! Free-text duration parsing ("3 months", "6 weeks", "1 Year").
//!
//! Only the leftmost `<digits> <unit>` phrase is used. Anything else in the
//! string is ignored, so "Starts in 3 months, twice weekly" reads as three
//! months. Compound phrases ("2 months 3 days") are not summed.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    Day,
    Week,
    Month,
    Year,
}

impl DurationUnit {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for DurationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParsedDuration {
    pub amount: u32,
    pub unit: DurationUnit,
}

impl fmt::Display for ParsedDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = if self.amount == 1 { "" } else { "s" };
        write!(f, "{} {}{}", self.amount, self.unit, plural)
    }
}

/// Why a duration string could not be read. This is an expected outcome for
/// human-entered text, not an exceptional one.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum ParseFailure {
    #[error("no '<number> <day|week|month|year>' phrase found")]
    NoMatch,
    #[error("fractional durations are not supported")]
    Fractional,
    #[error("duration amount is too large")]
    AmountOutOfRange,
}

/// Seam between the classifier and the duration text format.
pub trait ParseDuration {
    fn parse(&self, input: &str) -> Result<ParsedDuration, ParseFailure>;
}

/// The free-text parser used by the dashboard's enrollment records.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeText;

impl ParseDuration for FreeText {
    fn parse(&self, input: &str) -> Result<ParsedDuration, ParseFailure> {
        parse_duration(input)
    }
}

fn duration_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]+)\s*(?i-u:(day|week|month|year)s?)").ok())
        .as_ref()
}

pub fn parse_duration(input: &str) -> Result<ParsedDuration, ParseFailure> {
    let caps = duration_regex()
        .and_then(|re| re.captures(input))
        .ok_or(ParseFailure::NoMatch)?;
    let digits = caps.get(1).ok_or(ParseFailure::NoMatch)?;

    // "1.5 months" matches as "5 months"; refuse rather than guess.
    let before = &input.as_bytes()[..digits.start()];
    if let [.., d, b'.'] = before {
        if d.is_ascii_digit() {
            return Err(ParseFailure::Fractional);
        }
    }

    let amount: u32 = digits
        .as_str()
        .parse()
        .map_err(|_| ParseFailure::AmountOutOfRange)?;
    let unit = caps
        .get(2)
        .and_then(|m| DurationUnit::from_word(m.as_str()))
        .ok_or(ParseFailure::NoMatch)?;

    Ok(ParsedDuration { amount, unit })
}
