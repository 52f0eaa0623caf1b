//! Task CRUD, completion toggling and the stale completed-task sweep.

use crate::error::AppError;
use crate::model::{CompletionRequest, CreateTaskRequest, NewTask, Task, TaskChanges, TaskQuery, UpdateTaskRequest};
use crate::service::validation::RequestValidator;
use crate::store::TodoStore;
use chrono::{Duration, Utc};

/// Upper bound for the sweep retention window.
pub const MAX_RETENTION_DAYS: u32 = 3650;

pub struct TaskService;

impl TaskService {
    pub async fn list(store: &dyn TodoStore, user_id: i64, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let user_id = RequestValidator::positive_id("user_id", Some(user_id))?;
        store.list_tasks(user_id, query).await
    }

    /// Create a task. Priority defaults to Low, completed to false.
    pub async fn create(store: &dyn TodoStore, req: CreateTaskRequest) -> Result<Task, AppError> {
        let user_id = RequestValidator::positive_id("user_id", req.user_id)?;
        let title = RequestValidator::title(req.title.as_deref())?;
        let priority = RequestValidator::priority(req.priority.as_deref())?.unwrap_or_default();
        let task = store
            .insert_task(NewTask {
                user_id,
                title,
                description: req.description,
                due_date: req.due_date,
                priority,
                completed: req.completed.unwrap_or(false),
            })
            .await?;
        tracing::info!(task_id = task.id, user_id, "task created");
        Ok(task)
    }

    /// Partial update. An unknown id is not-found whatever the payload, so the body is only
    /// decoded once the task is known to exist. An empty payload is a validation error.
    pub async fn update(store: &dyn TodoStore, id: i64, body: serde_json::Value) -> Result<Task, AppError> {
        if store.find_task(id).await?.is_none() {
            return Err(AppError::NotFound(format!("task {} not found", id)));
        }
        let req: UpdateTaskRequest = serde_json::from_value(body)
            .map_err(|e| AppError::BadRequest(format!("invalid task update: {}", e)))?;
        let changes = TaskChanges {
            title: req.title.as_deref().map(|t| RequestValidator::title(Some(t))).transpose()?,
            description: req.description,
            due_date: req.due_date,
            priority: RequestValidator::priority(req.priority.as_deref())?,
            completed: req.completed,
        };
        if changes.is_empty() {
            return Err(AppError::Validation("no fields to update".into()));
        }
        let task = store
            .update_task(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task {} not found", id)))?;
        tracing::info!(task_id = id, "task updated");
        Ok(task)
    }

    pub async fn delete(store: &dyn TodoStore, id: i64) -> Result<(), AppError> {
        if !store.delete_task(id).await? {
            return Err(AppError::NotFound(format!("task {} not found", id)));
        }
        tracing::info!(task_id = id, "task deleted");
        Ok(())
    }

    /// Set only the completion flag. The flag must be present; checked before the task lookup.
    pub async fn set_completion(store: &dyn TodoStore, id: i64, req: CompletionRequest) -> Result<Task, AppError> {
        let completed = req
            .completed
            .ok_or_else(|| AppError::Validation("completed is required".into()))?;
        let task = store
            .update_task(id, &TaskChanges::completion(completed))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("task {} not found", id)))?;
        tracing::info!(task_id = id, completed, "task completion set");
        Ok(task)
    }

    /// Delete the user's tasks completed at least `older_than_days` ago. One statement, so a task
    /// reopened in the meantime is never removed.
    pub async fn sweep_completed(store: &dyn TodoStore, user_id: i64, older_than_days: u32) -> Result<u64, AppError> {
        let user_id = RequestValidator::positive_id("user_id", Some(user_id))?;
        if older_than_days > MAX_RETENTION_DAYS {
            return Err(AppError::Validation(format!(
                "older_than_days must be at most {}",
                MAX_RETENTION_DAYS
            )));
        }
        let cutoff = Utc::now() - Duration::days(i64::from(older_than_days));
        let deleted = store.delete_completed_before(user_id, cutoff).await?;
        if deleted > 0 {
            tracing::info!(user_id, deleted, "swept stale completed tasks");
        }
        Ok(deleted)
    }
}
