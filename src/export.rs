use crate::view::Row;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use std::path::Path;

pub const NOT_AVAILABLE: &str = "Not available";

#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Infer the format from a file extension, if it names one.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// One flat spreadsheet line per enrollment.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ExportRow {
    pub id: String,
    pub student: String,
    pub email: String,
    pub course: String,
    pub batch: String,
    pub start_date: String,
    pub duration: String,
    pub end_date: String,
    pub status: String,
}

const HEADERS: [&str; 9] = [
    "ID",
    "Student",
    "Email",
    "Course",
    "Batch",
    "Start Date",
    "Duration",
    "End Date",
    "Status",
];

pub fn format_date(date: Option<DateTime<Utc>>, date_format: &str) -> String {
    match date {
        Some(d) => d.format(date_format).to_string(),
        None => NOT_AVAILABLE.to_string(),
    }
}

impl ExportRow {
    pub fn from_row(row: &Row, date_format: &str) -> Self {
        let e = &row.enrollment;
        Self {
            id: e.id.clone(),
            student: e.student_name().unwrap_or_default().to_string(),
            email: e.student_email().unwrap_or_default().to_string(),
            course: e.course_name().unwrap_or_default().to_string(),
            batch: e.batch_name.clone().unwrap_or_default(),
            start_date: format_date(row.window.start_date, date_format),
            duration: row.window.duration.clone().unwrap_or_default(),
            end_date: format_date(row.assessment.end_date, date_format),
            status: row.status().to_string(),
        }
    }

    fn fields(&self) -> [&str; 9] {
        [
            self.id.as_str(),
            self.student.as_str(),
            self.email.as_str(),
            self.course.as_str(),
            self.batch.as_str(),
            self.start_date.as_str(),
            self.duration.as_str(),
            self.end_date.as_str(),
            self.status.as_str(),
        ]
    }
}

fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn to_csv(rows: &[ExportRow]) -> String {
    let mut out = String::new();
    out.push_str(&HEADERS.join(","));
    out.push_str("\r\n");
    for row in rows {
        let line: Vec<String> = row.fields().iter().map(|f| csv_quote(f)).collect();
        out.push_str(&line.join(","));
        out.push_str("\r\n");
    }
    out
}

pub fn to_json(rows: &[ExportRow]) -> Result<String> {
    serde_json::to_string_pretty(rows).context("Failed to serialize export rows")
}

pub fn render(rows: &[ExportRow], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => Ok(to_csv(rows)),
        ExportFormat::Json => to_json(rows),
    }
}

pub fn write_file(path: &Path, rows: &[ExportRow], format: ExportFormat) -> Result<()> {
    let content = render(rows, format)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write export file {}", path.display()))
}
