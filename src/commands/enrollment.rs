use crate::OutputFormat;
use crate::api::client::ApiClient;
use crate::api::retry::with_retry;
use crate::config::Config;
use crate::export::{ExportFormat, ExportRow, format_date};
use crate::platform;
use crate::view::{self, ListQuery, Row, StatusFilter};
use crate::window::{StatusCounts, assess};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

fn client(config: &Config) -> Result<ApiClient> {
    let base_url = config.base_url()?;
    let token = config.api_token();
    ApiClient::new(base_url, token.as_deref())
        .with_timeout(Duration::from_secs(config.api.timeout_secs))
}

fn fetch_rows(config: &Config, now: DateTime<Utc>) -> Result<Vec<Row>> {
    let client = client(config)?;
    let enrollments = with_retry(|| client.list_enrollments(), config.api.max_retries)?;
    Ok(view::evaluate(enrollments, now))
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() > width {
        let cut: String = s.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        s.to_string()
    }
}

pub fn list(config: &Config, query: &ListQuery, now: DateTime<Utc>, format: OutputFormat) -> Result<()> {
    let rows = fetch_rows(config, now)?;
    let page = query.apply(rows);

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.total == 0 {
        println!("No enrollments found.");
        return Ok(());
    }

    let date_format = &config.display.date_format;
    println!(
        "{:<26} {:<22} {:<24} {:<12} {:<14} {:<10}",
        "ID", "Student", "Course", "Start", "End", "Status"
    );
    println!("{}", "-".repeat(113));

    for row in &page.rows {
        let e = &row.enrollment;
        println!(
            "{:<26} {:<22} {:<24} {:<12} {:<14} {:<10}",
            truncate(&e.id, 26),
            truncate(e.student_name().unwrap_or("Unknown"), 22),
            truncate(e.course_name().unwrap_or("Unknown"), 24),
            format_date(row.window.start_date, date_format),
            format_date(row.assessment.end_date, date_format),
            row.status()
        );
    }

    println!(
        "\nPage {} of {} ({} enrollments)",
        page.page, page.total_pages, page.total
    );

    Ok(())
}

pub fn show(config: &Config, id: &str, now: DateTime<Utc>, format: OutputFormat) -> Result<()> {
    let client = client(config)?;
    let enrollment = with_retry(|| client.get_enrollment(id), config.api.max_retries)?;
    let window = enrollment
        .window()
        .with_context(|| format!("Enrollment {} has a malformed start date", id))?;
    let assessment = assess(&window, now);

    if let OutputFormat::Json = format {
        let out = json!({ "enrollment": enrollment, "assessment": assessment });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let date_format = &config.display.date_format;
    println!("Enrollment {}", enrollment.id);
    println!(
        "Student: {}",
        enrollment.student_name().unwrap_or("Unknown")
    );
    println!("Email: {}", enrollment.student_email().unwrap_or("-"));
    println!("Course: {}", enrollment.course_name().unwrap_or("Unknown"));
    println!("Batch: {}", enrollment.batch_name.as_deref().unwrap_or("-"));
    println!(
        "Start Date: {}",
        format_date(window.start_date, date_format)
    );
    println!("Duration: {}", window.duration.as_deref().unwrap_or("-"));
    println!(
        "End Date: {}",
        format_date(assessment.end_date, date_format)
    );
    match assessment.reason {
        Some(reason) => println!("Status: {} ({})", assessment.status, reason),
        None => println!("Status: {}", assessment.status),
    }

    Ok(())
}

pub fn stats(config: &Config, now: DateTime<Utc>, format: OutputFormat) -> Result<()> {
    let rows = fetch_rows(config, now)?;
    let counts = StatusCounts::tally(rows.iter().map(|r| &r.window), now);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&counts)?),
        OutputFormat::Text => {
            println!("Total:     {}", counts.total);
            println!("Active:    {}", counts.active);
            println!("Upcoming:  {}", counts.upcoming);
            println!("Completed: {}", counts.completed);
        }
    }

    Ok(())
}

pub struct ExportOptions {
    pub output: Option<PathBuf>,
    pub format: Option<ExportFormat>,
    pub status: Option<StatusFilter>,
    pub search: Option<String>,
}

pub fn export(config: &Config, options: ExportOptions, now: DateTime<Utc>) -> Result<PathBuf> {
    let rows = fetch_rows(config, now)?;
    let query = ListQuery {
        search: options.search,
        status: options.status,
        page: 1,
        page_size: usize::MAX,
        ..Default::default()
    };
    let page = query.apply(rows);

    let date_format = &config.display.date_format;
    let export_rows: Vec<ExportRow> = page
        .rows
        .iter()
        .map(|row| ExportRow::from_row(row, date_format))
        .collect();

    let (path, format) = match options.output {
        Some(path) => {
            let format = options
                .format
                .or_else(|| ExportFormat::from_path(&path))
                .unwrap_or(ExportFormat::Csv);
            (path, format)
        }
        None => {
            let format = options.format.unwrap_or(ExportFormat::Csv);
            let dir = platform::get_export_dir(None)?;
            let name = format!(
                "enrollments-{}.{}",
                now.format("%Y%m%d-%H%M%S"),
                format.extension()
            );
            (dir.join(name), format)
        }
    };

    crate::export::write_file(&path, &export_rows, format)?;
    info!(count = export_rows.len(), path = %path.display(), "export written");
    println!(
        "✓ Exported {} enrollments to {}",
        export_rows.len(),
        path.display()
    );

    Ok(path)
}

pub fn delete(config: &Config, id: &str, dry_run: bool) -> Result<()> {
    let client = client(config)?;

    if dry_run {
        let enrollment = with_retry(|| client.get_enrollment(id), config.api.max_retries)?;
        println!(
            "[DRY-RUN] Would delete enrollment {} ({} - {})",
            enrollment.id,
            enrollment.student_name().unwrap_or("Unknown"),
            enrollment.course_name().unwrap_or("Unknown")
        );
        return Ok(());
    }

    client.delete_enrollment(id)?;
    info!(%id, "enrollment deleted");
    println!("✓ Deleted enrollment {}", id);
    Ok(())
}
