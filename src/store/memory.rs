//! In-process store with the same observable semantics as the PostgreSQL one.
//! Used by tests and by `TODO_STORE=memory` for local development.

use crate::error::AppError;
use crate::model::{Credentials, NewTask, NewUser, Task, TaskChanges, TaskQuery, User};
use crate::sql::MAX_LIMIT;
use crate::store::TodoStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, Credentials>,
    tasks: BTreeMap<i64, Task>,
    last_user_id: i64,
    last_task_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Tables>, AppError> {
        self.tables
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Tables>, AppError> {
        self.tables
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".into()))
    }
}

fn apply(task: &mut Task, changes: &TaskChanges, now: DateTime<Utc>) {
    if let Some(title) = &changes.title {
        task.title = title.clone();
    }
    if let Some(description) = &changes.description {
        task.description = description.clone();
    }
    if let Some(due_date) = &changes.due_date {
        task.due_date = due_date.clone();
    }
    if let Some(priority) = changes.priority {
        task.priority = priority;
    }
    if let Some(completed) = changes.completed {
        task.completed = completed;
        task.completed_at = if completed { task.completed_at.or(Some(now)) } else { None };
    }
}

#[async_trait]
impl TodoStore for MemoryStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.read().map(|_| ())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut t = self.write()?;
        let taken = t
            .users
            .values()
            .any(|c| c.user.username == user.username || c.user.email == user.email);
        if taken {
            return Err(AppError::Conflict("username or email already exists".into()));
        }
        t.last_user_id += 1;
        let record = User {
            id: t.last_user_id,
            username: user.username,
            email: user.email,
            created_at: Utc::now(),
        };
        t.users.insert(
            record.id,
            Credentials {
                user: record.clone(),
                password_hash: user.password_hash,
            },
        );
        Ok(record)
    }

    async fn identity_taken(&self, username: &str, email: &str) -> Result<bool, AppError> {
        Ok(self
            .read()?
            .users
            .values()
            .any(|c| c.user.username == username || c.user.email == email))
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, AppError> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|c| c.user.username == username)
            .cloned())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.read()?.users.get(&id).map(|c| c.user.clone()))
    }

    async fn list_tasks(&self, user_id: i64, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let t = self.read()?;
        let limit = query.limit.map(|n| n.min(MAX_LIMIT) as usize).unwrap_or(usize::MAX);
        Ok(t.tasks
            .values()
            .filter(|task| task.user_id == user_id)
            .filter(|task| query.completed.map_or(true, |c| task.completed == c))
            .skip(query.offset.unwrap_or(0) as usize)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn insert_task(&self, task: NewTask) -> Result<Task, AppError> {
        let mut t = self.write()?;
        if !t.users.contains_key(&task.user_id) {
            return Err(AppError::Validation("user_id does not reference an existing user".into()));
        }
        t.last_task_id += 1;
        let now = Utc::now();
        let record = Task {
            id: t.last_task_id,
            user_id: task.user_id,
            title: task.title,
            description: task.description,
            due_date: task.due_date,
            priority: task.priority,
            completed: task.completed,
            completed_at: task.completed.then_some(now),
            created_at: now,
        };
        t.tasks.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn update_task(&self, id: i64, changes: &TaskChanges) -> Result<Option<Task>, AppError> {
        let mut t = self.write()?;
        Ok(t.tasks.get_mut(&id).map(|task| {
            apply(task, changes, Utc::now());
            task.clone()
        }))
    }

    async fn delete_task(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.write()?.tasks.remove(&id).is_some())
    }

    async fn delete_completed_before(&self, user_id: i64, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let mut t = self.write()?;
        let before = t.tasks.len();
        t.tasks.retain(|_, task| {
            !(task.user_id == user_id
                && task.completed
                && task.completed_at.map_or(false, |at| at <= cutoff))
        });
        Ok((before - t.tasks.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;

    async fn store_with_user() -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let user = store
            .insert_user(NewUser {
                username: "ada".into(),
                email: "ada@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap();
        (store, user.id)
    }

    fn new_task(user_id: i64, title: &str) -> NewTask {
        NewTask {
            user_id,
            title: title.into(),
            description: None,
            due_date: None,
            priority: Priority::Low,
            completed: false,
        }
    }

    #[tokio::test]
    async fn duplicate_identity_conflicts() {
        let (store, _) = store_with_user().await;
        let err = store
            .insert_user(NewUser {
                username: "other".into(),
                email: "ada@example.com".into(),
                password_hash: "x".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn task_requires_existing_user() {
        let store = MemoryStore::new();
        let err = store.insert_task(new_task(42, "orphan")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn list_filters_and_windows_in_id_order() {
        let (store, uid) = store_with_user().await;
        for i in 0..5 {
            store.insert_task(new_task(uid, &format!("t{}", i))).await.unwrap();
        }
        store.update_task(2, &TaskChanges::completion(true)).await.unwrap();

        let open = store
            .list_tasks(uid, &TaskQuery { completed: Some(false), ..TaskQuery::default() })
            .await
            .unwrap();
        assert_eq!(open.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3, 4, 5]);

        let window = store
            .list_tasks(uid, &TaskQuery { limit: Some(2), offset: Some(1), ..TaskQuery::default() })
            .await
            .unwrap();
        assert_eq!(window.iter().map(|t| t.id).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[tokio::test]
    async fn completion_maintains_completed_at() {
        let (store, uid) = store_with_user().await;
        store.insert_task(new_task(uid, "t")).await.unwrap();
        let done = store.update_task(1, &TaskChanges::completion(true)).await.unwrap().unwrap();
        let first = done.completed_at.unwrap();
        let again = store.update_task(1, &TaskChanges::completion(true)).await.unwrap().unwrap();
        assert_eq!(again.completed_at, Some(first));
        let reopened = store.update_task(1, &TaskChanges::completion(false)).await.unwrap().unwrap();
        assert_eq!(reopened.completed_at, None);
    }

    #[tokio::test]
    async fn sweep_only_removes_old_completed_tasks_of_that_user() {
        let (store, uid) = store_with_user().await;
        store.insert_task(new_task(uid, "done")).await.unwrap();
        store.insert_task(new_task(uid, "open")).await.unwrap();
        store.update_task(1, &TaskChanges::completion(true)).await.unwrap();

        let past = Utc::now() - chrono::Duration::days(1);
        assert_eq!(store.delete_completed_before(uid, past).await.unwrap(), 0);
        assert_eq!(store.delete_completed_before(uid + 1, Utc::now()).await.unwrap(), 0);
        assert_eq!(store.delete_completed_before(uid, Utc::now()).await.unwrap(), 1);
        assert!(store.find_task(1).await.unwrap().is_none());
        assert!(store.find_task(2).await.unwrap().is_some());
    }
}
