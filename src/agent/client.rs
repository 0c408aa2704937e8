//! HTTP client for the orchestrator's internal task API.

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::debug;

use super::TaskSource;
use crate::error::AgentError;
use crate::tasks::TaskId;
use crate::wire::{TaskPayload, TaskResponse, TaskResult};

/// Pulls tasks from `GET /internal/task` and pushes results to
/// `POST /internal/task`.
#[derive(Clone)]
pub struct HttpTaskSource {
    task_url: String,
    client: reqwest::Client,
}

impl HttpTaskSource {
    /// `base_url` is the orchestrator root, e.g. `http://localhost:8080`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        Self {
            task_url: format!("{}/internal/task", base_url.trim_end_matches('/')),
            client,
        }
    }

    fn request_failed(&self, err: reqwest::Error) -> AgentError {
        AgentError::RequestFailed {
            url: self.task_url.clone(),
            reason: err.to_string(),
        }
    }

    async fn unexpected_status(&self, response: reqwest::Response) -> AgentError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        AgentError::UnexpectedStatus {
            url: self.task_url.clone(),
            status,
            body,
        }
    }
}

#[async_trait]
impl TaskSource for HttpTaskSource {
    async fn pull_task(&self) -> Result<Option<TaskPayload>, AgentError> {
        let response = self
            .client
            .get(&self.task_url)
            .send()
            .await
            .map_err(|e| self.request_failed(e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let body: TaskResponse =
                    response
                        .json()
                        .await
                        .map_err(|e| AgentError::InvalidResponse {
                            url: self.task_url.clone(),
                            reason: e.to_string(),
                        })?;
                debug!(task_id = %body.task.id, "Pulled task");
                Ok(Some(body.task))
            }
            _ => Err(self.unexpected_status(response).await),
        }
    }

    async fn push_result(&self, task_id: &TaskId, result: f64) -> Result<(), AgentError> {
        let body = TaskResult {
            id: task_id.clone(),
            result,
        };
        let response = self
            .client
            .post(&self.task_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.request_failed(e))?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::NOT_FOUND | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                let reason = response.text().await.unwrap_or_default();
                Err(AgentError::Rejected {
                    id: task_id.clone(),
                    reason,
                })
            }
            _ => Err(self.unexpected_status(response).await),
        }
    }
}
