//! Client side of the remote task REST API.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::task::{StagePatch, Task, TaskPayload};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned {status}")]
    Status {
        status: StatusCode,
        message: Option<String>,
    },
}

impl ApiError {
    /// The server-provided message, if any, for appending to user-facing errors.
    pub fn detail(&self) -> String {
        match self {
            ApiError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// CRUD over the `/tasks` collection.
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, ApiError>;

    async fn get(&self, id: &str) -> Result<Task, ApiError>;

    async fn create(&self, payload: &TaskPayload) -> Result<(), ApiError>;

    async fn replace(&self, id: &str, payload: &TaskPayload) -> Result<(), ApiError>;

    /// Partial `PUT` carrying only the stage.
    async fn update_stage(&self, id: &str, patch: StagePatch) -> Result<(), ApiError>;

    async fn delete(&self, id: &str) -> Result<(), ApiError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: Client,
    base_url: String,
}

impl HttpTaskApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn task_url(&self, id: &str) -> String {
        self.url(&format!("/tasks/{id}"))
    }
}

async fn check(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    // Error bodies are best effort; an unreadable one still yields the status.
    let message = resp
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.message);
    Err(ApiError::Status { status, message })
}

/// The listing carries every user's tasks, so one malformed record is
/// skipped rather than failing the batch.
fn decode_tasks(records: Vec<Value>) -> Vec<Task> {
    records
        .into_iter()
        .filter_map(|record| {
            let id = record.get("_id").cloned().unwrap_or(Value::Null);
            match serde_json::from_value::<Task>(record) {
                Ok(task) => Some(task),
                Err(e) => {
                    warn!(%id, "skipping malformed task: {e}");
                    None
                }
            }
        })
        .collect()
}

#[async_trait]
impl TaskApi for HttpTaskApi {
    async fn list(&self) -> Result<Vec<Task>, ApiError> {
        let resp = self.client.get(self.url("/tasks")).send().await?;
        let records: Vec<Value> = check(resp).await?.json().await?;
        Ok(decode_tasks(records))
    }

    async fn get(&self, id: &str) -> Result<Task, ApiError> {
        let resp = self.client.get(self.task_url(id)).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    async fn create(&self, payload: &TaskPayload) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.url("/tasks"))
            .json(payload)
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    async fn replace(&self, id: &str, payload: &TaskPayload) -> Result<(), ApiError> {
        let resp = self.client.put(self.task_url(id)).json(payload).send().await?;
        check(resp).await?;
        Ok(())
    }

    async fn update_stage(&self, id: &str, patch: StagePatch) -> Result<(), ApiError> {
        let resp = self.client.put(self.task_url(id)).json(&patch).send().await?;
        check(resp).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let resp = self.client.delete(self.task_url(id)).send().await?;
        check(resp).await?;
        Ok(())
    }
}
