//! Presentation contract and the state handed to it.

use crate::model::Task;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TaskFilter {
    /// Value of the `completed` query parameter for this filter.
    pub fn completed(&self) -> Option<bool> {
        match self {
            TaskFilter::All => None,
            TaskFilter::Active => Some(false),
            TaskFilter::Completed => Some(true),
        }
    }
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskFilter::All => "all",
            TaskFilter::Active => "active",
            TaskFilter::Completed => "completed",
        })
    }
}

impl FromStr for TaskFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TaskFilter::All),
            "active" | "open" => Ok(TaskFilter::Active),
            "completed" | "done" => Ok(TaskFilter::Completed),
            other => Err(format!("unknown filter '{}'", other)),
        }
    }
}

/// Snapshot of what the task list should display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskListState {
    pub filter: TaskFilter,
    pub tasks: Vec<Task>,
    pub pages_loaded: usize,
    pub has_more: bool,
    pub loading: bool,
}

impl TaskListState {
    /// Finished loading and nothing matched the filter.
    pub fn is_empty(&self) -> bool {
        !self.loading && self.tasks.is_empty()
    }
}

/// Implemented by whatever presents the task list. Called from tokio tasks, never while the
/// controller's lock is held.
pub trait TaskListView: Send + Sync + 'static {
    fn render(&self, state: &TaskListState);
    fn show_error(&self, message: &str);
}
