use crate::domain::model::{Assignment, Employee};
use crate::domain::ports::AssignmentService;
use crate::utils::error::{Result, SantaError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct GenerateRequest<'a> {
    employees: &'a [Employee],
}

/// Client for `POST {base}/assign-secret-santa/generate/{year}`.
#[derive(Debug, Clone)]
pub struct HttpAssignmentClient {
    client: Client,
    base_url: String,
}

impl HttpAssignmentClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn endpoint(&self, year: i32) -> String {
        format!(
            "{}/assign-secret-santa/generate/{}",
            self.base_url.trim_end_matches('/'),
            year
        )
    }
}

/// 從錯誤回應中取出 `message` 欄位，沒有就用原始內容
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Something went wrong!")
                .to_string()
        })
}

#[async_trait]
impl AssignmentService for HttpAssignmentClient {
    async fn generate(&self, year: i32, employees: &[Employee]) -> Result<Vec<Assignment>> {
        let url = self.endpoint(year);
        tracing::debug!("Making API request to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest { employees })
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SantaError::RemoteCallError {
                status: Some(status.as_u16()),
                message: error_message(status, &body),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice::<Vec<Assignment>>(&body).map_err(|e| SantaError::RemoteCallError {
            status: Some(status.as_u16()),
            message: format!("malformed assignment payload: {}", e),
        })
    }
}
