//! Task handlers: list, create, update, delete, completion.

use crate::error::AppError;
use crate::extractors::ApiJson;
use crate::handlers::parse_id;
use crate::model::{CompletionRequest, CreateTaskRequest, MessageBody, TaskQuery};
use crate::service::TaskService;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;

fn parse_bool(key: &str, s: &str) -> Result<bool, AppError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(AppError::BadRequest(format!("{} must be true or false", key))),
    }
}

fn parse_u32(key: &str, s: &str) -> Result<u32, AppError> {
    s.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("{} must be a non-negative integer", key)))
}

/// `completed`, `limit` and `offset` are recognised; other keys are ignored.
fn task_query(params: &HashMap<String, String>) -> Result<TaskQuery, AppError> {
    let mut query = TaskQuery::default();
    for (k, v) in params {
        match k.as_str() {
            "completed" => query.completed = Some(parse_bool(k, v)?),
            "limit" => query.limit = Some(parse_u32(k, v)?),
            "offset" => query.offset = Some(parse_u32(k, v)?),
            _ => {}
        }
    }
    Ok(query)
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Path(user_id_str): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_id("user_id", &user_id_str)?;
    let query = task_query(&params)?;
    let tasks = TaskService::list(state.store.as_ref(), user_id, &query).await?;
    tracing::debug!(user_id, count = tasks.len(), "tasks listed");
    Ok(Json(tasks))
}

pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let task = TaskService::create(state.store.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    ApiJson(body): ApiJson<serde_json::Value>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("task id", &id_str)?;
    let task = TaskService::update(state.store.as_ref(), id, body).await?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("task id", &id_str)?;
    TaskService::delete(state.store.as_ref(), id).await?;
    Ok(Json(MessageBody {
        message: "Task deleted".into(),
    }))
}

pub async fn set_completion(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    ApiJson(body): ApiJson<CompletionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("task id", &id_str)?;
    let task = TaskService::set_completion(state.store.as_ref(), id, body).await?;
    Ok(Json(task))
}
