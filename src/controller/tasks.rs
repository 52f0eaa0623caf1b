//! Task list controller. Owns the list state and is its only writer.
//!
//! Every reload bumps a generation counter and cancels the load in flight, so results that
//! arrive for an older generation are dropped instead of overwriting newer state.

use crate::client::{ApiClient, ClientError};
use crate::controller::session::SessionContext;
use crate::controller::sweeper::StaleTaskSweeper;
use crate::controller::view::{TaskFilter, TaskListState, TaskListView};
use crate::model::{CreateTaskRequest, Priority, Task, TaskQuery, UpdateTaskRequest};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Inner {
    state: TaskListState,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

#[derive(Debug, Clone, Copy)]
enum LoadMode {
    Replace,
    Append,
}

pub struct TaskController<V: TaskListView> {
    api: ApiClient,
    session: SessionContext,
    view: Arc<V>,
    page_size: usize,
    inner: Arc<Mutex<Inner>>,
}

impl<V: TaskListView> Clone for TaskController<V> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            session: self.session.clone(),
            view: Arc::clone(&self.view),
            page_size: self.page_size,
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: TaskListView> TaskController<V> {
    pub fn new(api: ApiClient, session: SessionContext, view: Arc<V>, page_size: usize) -> Self {
        Self {
            api,
            session,
            view,
            page_size: page_size.max(1),
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    pub fn view(&self) -> &Arc<V> {
        &self.view
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Copy of the current list state.
    pub fn state(&self) -> TaskListState {
        self.lock().state.clone()
    }

    pub fn filter(&self) -> TaskFilter {
        self.lock().state.filter
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn signed_in(&self) -> Result<i64, ClientError> {
        self.session.user_id().ok_or(ClientError::NotSignedIn)
    }

    fn report(&self, err: ClientError) -> ClientError {
        self.view.show_error(&err.user_message());
        err
    }

    /// Switch filter and reload from the first page.
    pub fn set_filter(&self, filter: TaskFilter) -> Option<JoinHandle<()>> {
        self.lock().state.filter = filter;
        self.reload()
    }

    /// Discard the list and fetch the first page. Cancels any load in flight.
    /// Returns `None` when nobody is signed in.
    pub fn reload(&self) -> Option<JoinHandle<()>> {
        let user_id = match self.signed_in() {
            Ok(id) => id,
            Err(e) => {
                self.report(e);
                return None;
            }
        };
        let (token, generation, query, snapshot) = {
            let mut inner = self.lock();
            if let Some(prev) = inner.in_flight.take() {
                prev.cancel();
            }
            inner.generation += 1;
            let state = &mut inner.state;
            state.tasks.clear();
            state.pages_loaded = 0;
            state.has_more = false;
            state.loading = true;
            let query = self.page_query(state.filter, 0);
            let token = CancellationToken::new();
            inner.in_flight = Some(token.clone());
            (token, inner.generation, query, inner.state.clone())
        };
        self.view.render(&snapshot);
        Some(self.spawn_load(user_id, token, generation, query, LoadMode::Replace))
    }

    /// Reload and wait for the result to be applied.
    pub async fn refresh(&self) {
        if let Some(handle) = self.reload() {
            let _ = handle.await;
        }
    }

    /// Fetch the next page. Ignored while a load is running or when the last page was short.
    pub fn load_more(&self) -> Option<JoinHandle<()>> {
        let user_id = self.session.user_id()?;
        let (token, generation, query, snapshot) = {
            let mut inner = self.lock();
            if inner.state.loading || !inner.state.has_more {
                return None;
            }
            inner.state.loading = true;
            let offset = inner.state.pages_loaded * self.page_size;
            let query = self.page_query(inner.state.filter, offset);
            let token = CancellationToken::new();
            inner.in_flight = Some(token.clone());
            (token, inner.generation, query, inner.state.clone())
        };
        self.view.render(&snapshot);
        Some(self.spawn_load(user_id, token, generation, query, LoadMode::Append))
    }

    /// One extra row tells us whether another page exists.
    fn page_query(&self, filter: TaskFilter, offset: usize) -> TaskQuery {
        TaskQuery {
            completed: filter.completed(),
            limit: Some(u32::try_from(self.page_size.saturating_add(1)).unwrap_or(u32::MAX)),
            offset: Some(u32::try_from(offset).unwrap_or(u32::MAX)),
        }
    }

    fn spawn_load(
        &self,
        user_id: i64,
        token: CancellationToken,
        generation: u64,
        query: TaskQuery,
        mode: LoadMode,
    ) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(generation, "task load cancelled");
                    return;
                }
                result = this.api.list_tasks(user_id, &query) => result,
            };
            this.apply(generation, result, mode);
        })
    }

    fn apply(&self, generation: u64, result: Result<Vec<Task>, ClientError>, mode: LoadMode) {
        let outcome = {
            let mut inner = self.lock();
            if inner.generation != generation {
                tracing::debug!(generation, current = inner.generation, "dropping stale task page");
                return;
            }
            inner.in_flight = None;
            inner.state.loading = false;
            match result {
                Ok(mut tasks) => {
                    let has_more = tasks.len() > self.page_size;
                    tasks.truncate(self.page_size);
                    let state = &mut inner.state;
                    match mode {
                        LoadMode::Replace => state.tasks = tasks,
                        LoadMode::Append => state.tasks.extend(tasks),
                    }
                    state.pages_loaded += 1;
                    state.has_more = has_more;
                    Ok(state.clone())
                }
                Err(e) => Err((e, inner.state.clone())),
            }
        };
        match outcome {
            Ok(snapshot) => self.view.render(&snapshot),
            Err((e, snapshot)) => {
                tracing::warn!(error = %e, "loading tasks failed");
                self.view.render(&snapshot);
                self.view.show_error(&e.user_message());
            }
        }
    }

    /// Create a task for the signed-in user, then reload the list.
    pub async fn add_task(
        &self,
        title: &str,
        description: Option<&str>,
        due_date: Option<&str>,
        priority: Priority,
    ) -> Result<Task, ClientError> {
        let user_id = self.signed_in().map_err(|e| self.report(e))?;
        if title.trim().is_empty() {
            return Err(self.report(ClientError::Validation("Title is required".into())));
        }
        let mut req = CreateTaskRequest::new(user_id, title.trim()).priority(priority);
        if let Some(d) = description.filter(|d| !d.trim().is_empty()) {
            req = req.description(d);
        }
        if let Some(d) = due_date.filter(|d| !d.trim().is_empty()) {
            req = req.due_date(d);
        }
        let task = self.api.create_task(&req).await.map_err(|e| self.report(e))?;
        self.reload();
        Ok(task)
    }

    pub async fn update_task(&self, task_id: i64, changes: &UpdateTaskRequest) -> Result<Task, ClientError> {
        self.signed_in().map_err(|e| self.report(e))?;
        if changes.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(self.report(ClientError::Validation("Title is required".into())));
        }
        let task = self
            .api
            .update_task(task_id, changes)
            .await
            .map_err(|e| self.report(e))?;
        self.reload();
        Ok(task)
    }

    pub async fn toggle_completion(&self, task_id: i64, completed: bool) -> Result<Task, ClientError> {
        self.signed_in().map_err(|e| self.report(e))?;
        let task = self
            .api
            .set_completion(task_id, completed)
            .await
            .map_err(|e| self.report(e))?;
        self.reload();
        Ok(task)
    }

    pub async fn delete_task(&self, task_id: i64) -> Result<(), ClientError> {
        self.signed_in().map_err(|e| self.report(e))?;
        self.api.delete_task(task_id).await.map_err(|e| self.report(e))?;
        self.reload();
        Ok(())
    }

    /// Ask the server to drop tasks completed at least `retention_days` ago. Reloads when
    /// anything was removed. Failures are returned, not shown.
    pub async fn sweep_once(&self, retention_days: u32) -> Result<u64, ClientError> {
        let user_id = self.signed_in()?;
        let deleted = self.api.sweep_completed(user_id, retention_days).await?;
        if deleted > 0 {
            tracing::info!(user_id, deleted, "stale completed tasks removed");
            self.reload();
        }
        Ok(deleted)
    }

    pub fn spawn_sweeper(&self, interval: Duration, retention_days: u32) -> StaleTaskSweeper {
        StaleTaskSweeper::spawn(self.clone(), interval, retention_days)
    }
}
