//! Client-side controllers: session context, task list state, and the stale-task sweeper.
//! Presentation plugs in through `TaskListView`.

mod session;
mod sweeper;
mod tasks;
mod view;

pub use session::SessionContext;
pub use sweeper::StaleTaskSweeper;
pub use tasks::TaskController;
pub use view::{TaskFilter, TaskListState, TaskListView};
