//! Account handlers: signup, login, user lookup, and the per-user completed-task sweep.

use crate::error::AppError;
use crate::extractors::ApiJson;
use crate::handlers::parse_id;
use crate::model::{LoginRequest, SignupRequest, SweepResponse};
use crate::service::{AccountService, TaskService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;

const DEFAULT_RETENTION_DAYS: u32 = 7;

pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let created = AccountService::signup(state.store.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = AccountService::login(state.store.as_ref(), body).await?;
    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(user))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id("user id", &id_str)?;
    let user = AccountService::get_user(state.store.as_ref(), id).await?;
    Ok(Json(user))
}

pub async fn sweep_completed(
    State(state): State<AppState>,
    Path(id_str): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = parse_id("user id", &id_str)?;
    let older_than_days = match params.get("older_than_days") {
        Some(v) => v
            .trim()
            .parse::<u32>()
            .map_err(|_| AppError::BadRequest("older_than_days must be a non-negative integer".into()))?,
        None => DEFAULT_RETENTION_DAYS,
    };
    let deleted = TaskService::sweep_completed(state.store.as_ref(), user_id, older_than_days).await?;
    Ok(Json(SweepResponse { deleted }))
}
