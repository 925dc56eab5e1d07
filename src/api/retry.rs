use crate::error::ApiError;
use anyhow::Result;
use std::thread::sleep;
use std::time::Duration;
use tracing::{error, warn};

/// Worth another attempt: timeouts, connection failures and 5xx responses.
/// A 404 or an envelope with `success: false` is a final answer.
pub fn is_transient(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        if let Some(api) = cause.downcast_ref::<ApiError>() {
            return matches!(api, ApiError::Status(status) if *status >= 500);
        }
        if let Some(http) = cause.downcast_ref::<reqwest::Error>() {
            return http.is_timeout() || http.is_connect() || http.is_request();
        }
        false
    })
}

/// Retry an idempotent request on transient failures with exponential
/// backoff (100ms, 200ms, 400ms...).
pub fn with_retry<F, T>(operation: F, max_retries: u32) -> Result<T>
where
    F: Fn() -> Result<T>,
{
    with_retry_when(operation, max_retries, Duration::from_millis(100), is_transient)
}

pub fn with_retry_when<F, T, R>(
    operation: F,
    max_retries: u32,
    base: Duration,
    retryable: R,
) -> Result<T>
where
    F: Fn() -> Result<T>,
    R: Fn(&anyhow::Error) -> bool,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) if attempt < max_retries && retryable(&e) => {
                let backoff = base * 2_u32.saturating_pow(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_retries,
                    backoff_ms = backoff.as_millis() as u64,
                    "API call failed: {e:#}. Retrying"
                );
                sleep(backoff);
                attempt += 1;
            }
            Err(e) => {
                error!(attempts = attempt + 1, "API call failed: {e:#}");
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn server_error() -> anyhow::Error {
        ApiError::Status(503).into()
    }

    #[test]
    fn test_retry_succeeds_on_first_attempt() {
        let result = with_retry(|| Ok::<i32, anyhow::Error>(42), 3);
        assert_eq!(result.unwrap(), 42);
    }

    #[test]
    fn test_retry_succeeds_after_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = with_retry_when(
            move || {
                let count = counter_clone.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(server_error())
                } else {
                    Ok(42)
                }
            },
            3,
            Duration::from_millis(1),
            is_transient,
        );

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_retry_exhausts_attempts() {
        let counter = AtomicU32::new(0);
        let result: Result<i32> = with_retry_when(
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(server_error())
            },
            2,
            Duration::from_millis(1),
            is_transient,
        );
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_zero_retries_runs_once() {
        let counter = AtomicU32::new(0);
        let result: Result<i32> = with_retry(
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(server_error())
            },
            0,
        );
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_final_answers_are_not_retried() {
        let answers: [fn() -> anyhow::Error; 4] = [
            || ApiError::NotFound("enr-1".to_string()).into(),
            || ApiError::Rejected("Admin access required".to_string()).into(),
            || ApiError::Status(401).into(),
            || anyhow::anyhow!("Failed to parse enrollments response"),
        ];
        for err in answers {
            let counter = AtomicU32::new(0);
            let result: Result<i32> = with_retry(
                || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(err())
                },
                3,
            );
            assert!(result.is_err());
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_transient_check_sees_through_context() {
        use anyhow::Context;
        let wrapped = Err::<(), _>(ApiError::Status(502))
            .context("Failed to list enrollments")
            .unwrap_err();
        assert!(is_transient(&wrapped));
        assert!(!is_transient(&ApiError::Status(404).into()));
    }
}
