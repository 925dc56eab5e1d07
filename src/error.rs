use thiserror::Error;

/// Contract violations at the record boundary. Missing or free-text data is
/// never an error here; only values that cannot be dates at all are.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("Invalid start date '{0}', expected YYYY-MM-DD or RFC 3339")]
    InvalidStartDate(String),
}

/// Failures reported by the backend, through its status code or its
/// response envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Backend returned status {0}")]
    Status(u16),
    #[error("Enrollment {0} not found")]
    NotFound(String),
    #[error("Backend rejected request: {0}")]
    Rejected(String),
    #[error("Backend response is missing its 'data' payload")]
    MissingData,
}
