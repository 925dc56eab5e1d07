//! In-memory search, status filter, sort and pagination for the enrollment
//! list. State lives in a [`ListQuery`] built per invocation.

use crate::api::models::Enrollment;
use crate::window::{Assessment, EnrollmentStatus, EnrollmentWindow, assess};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::warn;

#[derive(Clone, Copy, ValueEnum, Debug, Default, PartialEq, Eq, Serialize)]
pub enum SortKey {
    #[default]
    Start,
    Student,
    Course,
    Status,
}

#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    Active,
    Upcoming,
    Completed,
}

impl StatusFilter {
    pub fn matches(&self, status: EnrollmentStatus) -> bool {
        matches!(
            (self, status),
            (Self::Active, EnrollmentStatus::Active)
                | (Self::Upcoming, EnrollmentStatus::Upcoming)
                | (Self::Completed, EnrollmentStatus::Completed)
        )
    }
}

#[derive(Debug, Clone)]
pub struct ListQuery {
    pub search: Option<String>,
    pub status: Option<StatusFilter>,
    pub sort: SortKey,
    pub descending: bool,
    /// 1-based
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            sort: SortKey::default(),
            descending: false,
            page: 1,
            page_size: 10,
        }
    }
}

/// An enrollment with its window evaluated once against the list's `now`.
#[derive(Debug, Clone, Serialize)]
pub struct Row {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    #[serde(skip)]
    pub window: EnrollmentWindow,
    #[serde(flatten)]
    pub assessment: Assessment,
}

impl Row {
    pub fn status(&self) -> EnrollmentStatus {
        self.assessment.status
    }
}

#[derive(Debug, Serialize)]
pub struct Page {
    pub rows: Vec<Row>,
    pub page: usize,
    pub total_pages: usize,
    /// Rows matching the filters, across all pages
    pub total: usize,
}

/// Evaluate every record against one `now`. Records whose start date is not a
/// date are logged and skipped.
pub fn evaluate(enrollments: Vec<Enrollment>, now: DateTime<Utc>) -> Vec<Row> {
    enrollments
        .into_iter()
        .filter_map(|enrollment| match enrollment.window() {
            Ok(window) => {
                let assessment = assess(&window, now);
                Some(Row {
                    enrollment,
                    window,
                    assessment,
                })
            }
            Err(e) => {
                warn!(id = %enrollment.id, "skipping enrollment: {e}");
                None
            }
        })
        .collect()
}

fn matches_search(row: &Row, needle: &str) -> bool {
    let e = &row.enrollment;
    [
        e.student_name(),
        e.student_email(),
        e.course_name(),
        e.batch_name.as_deref(),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

fn compare_text(a: Option<&str>, b: Option<&str>) -> Ordering {
    // Missing values sort last regardless of direction
    match (a, b) {
        (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare(a: &Row, b: &Row, key: SortKey, descending: bool) -> Ordering {
    let directed = |o: Ordering| if descending { o.reverse() } else { o };
    match key {
        SortKey::Start => match (a.window.start_date, b.window.start_date) {
            (Some(x), Some(y)) => directed(x.cmp(&y)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        SortKey::Student => {
            let (x, y) = (a.enrollment.student_name(), b.enrollment.student_name());
            match (x, y) {
                (Some(_), Some(_)) => directed(compare_text(x, y)),
                _ => compare_text(x, y),
            }
        }
        SortKey::Course => {
            let (x, y) = (a.enrollment.course_name(), b.enrollment.course_name());
            match (x, y) {
                (Some(_), Some(_)) => directed(compare_text(x, y)),
                _ => compare_text(x, y),
            }
        }
        SortKey::Status => directed(a.status().cmp(&b.status())),
    }
}

impl ListQuery {
    /// Filter, sort (stable) and cut out the requested page.
    pub fn apply(&self, rows: Vec<Row>) -> Page {
        let needle = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut matched: Vec<Row> = rows
            .into_iter()
            .filter(|row| self.status.is_none_or(|s| s.matches(row.status())))
            .filter(|row| needle.as_deref().is_none_or(|n| matches_search(row, n)))
            .collect();

        matched.sort_by(|a, b| compare(a, b, self.sort, self.descending));

        let page_size = self.page_size.max(1);
        let total = matched.len();
        let total_pages = total.div_ceil(page_size).max(1);
        let page = self.page.max(1);

        let rows = matched
            .into_iter()
            .skip((page - 1).saturating_mul(page_size))
            .take(page_size)
            .collect();

        Page {
            rows,
            page,
            total_pages,
            total,
        }
    }
}
