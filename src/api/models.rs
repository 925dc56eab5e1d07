use crate::error::{ApiError, WindowError};
use crate::window::{EnrollmentWindow, parse_date};
use serde::{Deserialize, Serialize};

/// Envelope every backend endpoint wraps its payload in.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the payload, turning `success: false` into an error.
    pub fn into_data(self) -> Result<T, ApiError> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.message.unwrap_or_else(|| "no message".to_string()),
            ));
        }
        self.data.ok_or(ApiError::MissingData)
    }
}

/// A reference field that is either populated with the document or left as
/// a bare id, depending on the backend query.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum Ref<T> {
    Populated(T),
    Id(String),
}

impl<T> Ref<T> {
    pub fn populated(&self) -> Option<&T> {
        match self {
            Ref::Populated(doc) => Some(doc),
            Ref::Id(_) => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UserSummary {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CourseSummary {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Batch enrollment record as the backend returns it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Enrollment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "userId", default)]
    pub user: Option<Ref<UserSummary>>,
    #[serde(rename = "courseId", default)]
    pub course: Option<Ref<CourseSummary>>,
    #[serde(rename = "batchName", default)]
    pub batch_name: Option<String>,
    #[serde(rename = "startDate", default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<String>,
}

impl Enrollment {
    pub fn student_name(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(Ref::populated)
            .and_then(|u| u.name.as_deref())
    }

    pub fn student_email(&self) -> Option<&str> {
        self.user
            .as_ref()
            .and_then(Ref::populated)
            .and_then(|u| u.email.as_deref())
    }

    pub fn course_name(&self) -> Option<&str> {
        self.course
            .as_ref()
            .and_then(Ref::populated)
            .and_then(|c| c.name.as_deref())
    }

    /// Normalize the record into the calculator's input. Blank strings count
    /// as absent; a start date that isn't a date at all is an error.
    pub fn window(&self) -> Result<EnrollmentWindow, WindowError> {
        let start_date = match non_blank(self.start_date.as_deref()) {
            Some(raw) => Some(parse_date(raw)?),
            None => None,
        };
        let duration = non_blank(self.duration.as_deref()).map(str::to_string);
        Ok(EnrollmentWindow::new(start_date, duration))
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
