//! todo-sdk: REST backend and client SDK for the to-do list app.

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod model;
pub mod password;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use client::{ApiClient, ClientError};
pub use config::{ClientConfig, ServerConfig, StoreBackend};
pub use controller::{SessionContext, StaleTaskSweeper, TaskController, TaskFilter, TaskListState, TaskListView};
pub use error::{AppError, ConfigError};
pub use model::{Priority, Task, User};
pub use routes::{api_routes, app_router, common_routes};
pub use service::{AccountService, TaskService};
pub use state::AppState;
pub use store::{ensure_database_exists, MemoryStore, PgStore, TodoStore};
