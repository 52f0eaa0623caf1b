//! Router assembly.

mod api;
mod common;
pub use api::api_routes;
pub use common::common_routes;

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, OriginalUri},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

async fn no_route(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}

/// Full application: common routes at the root, REST API under `/api`, request tracing.
/// Bodies over `body_limit_bytes` are rejected by the JSON extractor with a 413 envelope.
pub fn app_router(state: AppState, body_limit_bytes: usize) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .nest("/api", api_routes(state))
        .fallback(no_route)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(body_limit_bytes)),
        )
}
