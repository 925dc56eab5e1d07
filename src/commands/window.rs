//! Offline calculator commands: no backend access.

use crate::OutputFormat;
use crate::export::format_date;
use crate::window::{EnrollmentWindow, assess, compute_end_date, parse_date, parse_duration};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;

pub fn parse(text: &str, format: OutputFormat) -> Result<()> {
    let result = parse_duration(text);

    match format {
        OutputFormat::Json => {
            let out = match result {
                Ok(parsed) => json!({ "input": text, "parsed": parsed, "error": null }),
                Err(failure) => {
                    json!({ "input": text, "parsed": null, "error": failure.to_string() })
                }
            };
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => match result {
            Ok(parsed) => println!(
                "{} (amount: {}, unit: {})",
                parsed, parsed.amount, parsed.unit
            ),
            Err(failure) => println!("Could not parse duration: {}", failure),
        },
    }

    Ok(())
}

pub fn end_date(start: &str, duration: &str, date_format: &str, format: OutputFormat) -> Result<()> {
    let start = parse_date(start).context("Invalid --start")?;
    let end = compute_end_date(start, duration);

    match format {
        OutputFormat::Json => {
            let out = json!({ "start_date": start, "duration": duration, "end_date": end });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => println!("End Date: {}", format_date(end, date_format)),
    }

    Ok(())
}

pub fn status(
    start: Option<&str>,
    duration: Option<&str>,
    now: DateTime<Utc>,
    format: OutputFormat,
) -> Result<()> {
    let start_date = start
        .map(parse_date)
        .transpose()
        .context("Invalid --start")?;
    let window = EnrollmentWindow::new(start_date, duration.map(str::to_string));
    let assessment = assess(&window, now);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&assessment)?),
        OutputFormat::Text => match assessment.reason {
            Some(reason) => println!("{} ({})", assessment.status, reason),
            None => println!("{}", assessment.status),
        },
    }

    Ok(())
}
