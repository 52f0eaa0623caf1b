//! REST routes for accounts and tasks, mounted under `/api`.

use crate::handlers::{
    create_task, delete_task, get_user, list_tasks, login, set_completion, signup, sweep_completed, update_task,
};
use crate::state::AppState;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};

/// `GET /tasks/:id` lists by *user* id while `PUT`/`DELETE /tasks/:id` take a *task* id; the
/// router only allows one parameter name per path.
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/users/:id", get(get_user))
        .route("/users/:id/completed-tasks", delete(sweep_completed))
        .route("/tasks", post(create_task))
        .route("/tasks/:id", get(list_tasks).put(update_task).delete(delete_task))
        .route("/tasks/completion/:id", patch(set_completion))
        .with_state(state)
}
