//! Persistence seam: the `TodoStore` trait and its PostgreSQL and in-memory implementations.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use crate::error::AppError;
use crate::model::{Credentials, NewTask, NewUser, Task, TaskChanges, TaskQuery, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Row-level operations behind the REST handlers. Each call is one statement; nothing spans calls.
#[async_trait]
pub trait TodoStore: Send + Sync {
    /// Cheap round trip used by the readiness probe.
    async fn ping(&self) -> Result<(), AppError>;

    /// Insert a user. Duplicate username or email is `AppError::Conflict`.
    async fn insert_user(&self, user: NewUser) -> Result<User, AppError>;

    /// True when any user already has this username or this email.
    async fn identity_taken(&self, username: &str, email: &str) -> Result<bool, AppError>;

    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, AppError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Tasks of `user_id` in id order. Unknown users simply have no tasks.
    async fn list_tasks(&self, user_id: i64, query: &TaskQuery) -> Result<Vec<Task>, AppError>;

    /// Insert a task. A `user_id` with no matching user is `AppError::Validation`.
    async fn insert_task(&self, task: NewTask) -> Result<Task, AppError>;

    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError>;

    /// Apply `changes`; `None` when the task does not exist.
    async fn update_task(&self, id: i64, changes: &TaskChanges) -> Result<Option<Task>, AppError>;

    /// False when there was nothing to delete.
    async fn delete_task(&self, id: i64) -> Result<bool, AppError>;

    /// Remove the user's completed tasks whose `completed_at` is at or before `cutoff`. Returns the count.
    async fn delete_completed_before(&self, user_id: i64, cutoff: DateTime<Utc>) -> Result<u64, AppError>;
}
