use crate::api::models::{ApiResponse, Enrollment};
use crate::error::ApiError;
use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use std::time::Duration;
use tracing::debug;

pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(str::to_string),
        }
    }

    /// Replace the underlying HTTP client with one that gives up after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// GET /api/enrollments
    pub fn list_enrollments(&self) -> Result<Vec<Enrollment>> {
        let url = format!("{}/api/enrollments", self.base_url);
        debug!(%url, "fetching enrollments");

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .context("Failed to send request to enrollments API")?;

        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()))
                .context("Failed to list enrollments");
        }

        let envelope = response
            .json::<ApiResponse<Vec<Enrollment>>>()
            .context("Failed to parse enrollments response")?;

        let enrollments = envelope.into_data()?;
        debug!(count = enrollments.len(), "enrollments fetched");
        Ok(enrollments)
    }

    /// GET /api/enrollments/{id}
    pub fn get_enrollment(&self, id: &str) -> Result<Enrollment> {
        let url = format!("{}/api/enrollments/{}", self.base_url, id);
        debug!(%url, "fetching enrollment");

        let response = self
            .authorized(self.client.get(&url))
            .send()
            .context("Failed to send request to enrollments API")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(id.to_string()).into());
        }
        if !response.status().is_success() {
            return Err(ApiError::Status(response.status().as_u16()))
                .with_context(|| format!("Failed to fetch enrollment {}", id));
        }

        let envelope = response
            .json::<ApiResponse<Enrollment>>()
            .context("Failed to parse enrollment response")?;

        Ok(envelope.into_data()?)
    }

    /// DELETE /api/enrollments/{id}
    pub fn delete_enrollment(&self, id: &str) -> Result<()> {
        let url = format!("{}/api/enrollments/{}", self.base_url, id);
        debug!(%url, "deleting enrollment");

        let response = self
            .authorized(self.client.delete(&url))
            .send()
            .context("Failed to send delete request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            anyhow::bail!("Delete enrollment failed ({}): {}", status, body);
        }

        let envelope = response
            .json::<ApiResponse<serde_json::Value>>()
            .context("Failed to parse delete response")?;

        if !envelope.success {
            anyhow::bail!(
                "Delete enrollment rejected: {}",
                envelope.message.unwrap_or_else(|| "no message".to_string())
            );
        }

        Ok(())
    }
}
