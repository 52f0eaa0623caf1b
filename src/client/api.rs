//! `ApiClient`: one method per REST endpoint, fixed timeout, no automatic retries.

use crate::client::error::ClientError;
use crate::config::ClientConfig;
use crate::error::ErrorBody;
use crate::model::{
    CompletionRequest, CreateTaskRequest, LoginRequest, MessageBody, SignupRequest, SignupResponse, SweepResponse,
    Task, TaskQuery, UpdateTaskRequest, User,
};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// Cheap to clone; clones share the connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ClientError::Network)?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, ClientError> {
        let resp = req.send().await.map_err(|e| {
            tracing::warn!(error = %e, "request failed before a response");
            ClientError::Network(e)
        })?;
        decode(resp).await
    }

    /// `GET /health` on the server root (the base URL minus its `/api` suffix).
    pub async fn health(&self) -> Result<serde_json::Value, ClientError> {
        let root = self.base_url.strip_suffix("/api").unwrap_or(&self.base_url);
        self.send(self.http.get(format!("{}/health", root))).await
    }

    pub async fn signup(&self, req: &SignupRequest) -> Result<SignupResponse, ClientError> {
        self.send(self.http.post(self.url("/signup")).json(req)).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        let body = LoginRequest::new(username, password);
        self.send(self.http.post(self.url("/login")).json(&body)).await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, ClientError> {
        self.send(self.http.get(self.url(&format!("/users/{}", user_id)))).await
    }

    pub async fn list_tasks(&self, user_id: i64, query: &TaskQuery) -> Result<Vec<Task>, ClientError> {
        self.send(self.http.get(self.url(&format!("/tasks/{}", user_id))).query(query))
            .await
    }

    pub async fn create_task(&self, req: &CreateTaskRequest) -> Result<Task, ClientError> {
        self.send(self.http.post(self.url("/tasks")).json(req)).await
    }

    pub async fn update_task(&self, task_id: i64, req: &UpdateTaskRequest) -> Result<Task, ClientError> {
        self.send(self.http.put(self.url(&format!("/tasks/{}", task_id))).json(req))
            .await
    }

    pub async fn delete_task(&self, task_id: i64) -> Result<(), ClientError> {
        let _: MessageBody = self
            .send(self.http.delete(self.url(&format!("/tasks/{}", task_id))))
            .await?;
        Ok(())
    }

    pub async fn set_completion(&self, task_id: i64, completed: bool) -> Result<Task, ClientError> {
        let body = CompletionRequest {
            completed: Some(completed),
        };
        self.send(
            self.http
                .patch(self.url(&format!("/tasks/completion/{}", task_id)))
                .json(&body),
        )
        .await
    }

    /// Server-side removal of the user's tasks completed at least `older_than_days` ago.
    pub async fn sweep_completed(&self, user_id: i64, older_than_days: u32) -> Result<u64, ClientError> {
        let resp: SweepResponse = self
            .send(
                self.http
                    .delete(self.url(&format!("/users/{}/completed-tasks", user_id)))
                    .query(&[("older_than_days", older_than_days)]),
            )
            .await?;
        Ok(resp.deleted)
    }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return resp.json::<T>().await.map_err(|e| ClientError::Decode(e.to_string()));
    }
    let text = resp.text().await.unwrap_or_default();
    let err = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(body) => ClientError::Api {
            status: status.as_u16(),
            code: body.error.code,
            message: body.error.message,
        },
        Err(_) => ClientError::Api {
            status: status.as_u16(),
            code: "http_error".into(),
            message: if text.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                text
            },
        },
    };
    tracing::debug!(status = status.as_u16(), error = %err, "api error");
    Err(err)
}
