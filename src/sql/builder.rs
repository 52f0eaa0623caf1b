//! Builds parameterized SELECT, INSERT, UPDATE, DELETE for the tasks table.
//! Identifiers come from constants and validated config only; values are always parameters.

use crate::model::{NewTask, TaskChanges, TaskQuery};
use crate::sql::params::PgBindValue;
use chrono::{DateTime, Utc};

/// Task columns in select order, with the PostgreSQL type used for placeholder casts.
pub const TASK_COLUMNS: &[(&str, &str)] = &[
    ("id", "bigint"),
    ("user_id", "bigint"),
    ("title", "text"),
    ("description", "text"),
    ("due_date", "text"),
    ("priority", "text"),
    ("completed", "boolean"),
    ("completed_at", "timestamptz"),
    ("created_at", "timestamptz"),
];

/// Hard cap on page size, whatever the caller asks for.
pub const MAX_LIMIT: u32 = 1000;

/// Quote identifier for PostgreSQL.
pub fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub fn qualified_table(schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(table))
}

fn pg_type(column: &str) -> &'static str {
    TASK_COLUMNS
        .iter()
        .find(|(name, _)| *name == column)
        .map(|(_, t)| *t)
        .unwrap_or("text")
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: impl Into<PgBindValue>) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v.into());
        n
    }

    /// Push a value and return its typed placeholder for `column`, e.g. `$2::boolean`.
    fn placeholder(&mut self, column: &str, v: impl Into<PgBindValue>) -> String {
        let n = self.push_param(v);
        format!("${}::{}", n, pg_type(column))
    }
}

pub fn task_column_list() -> String {
    TASK_COLUMNS
        .iter()
        .map(|(name, _)| quoted(name))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn select_task_by_id(schema: &str, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder("id", id);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = {}",
        task_column_list(),
        qualified_table(schema, "tasks"),
        quoted("id"),
        ph
    );
    q
}

/// Tasks of one user, optional completion filter, ORDER BY id, optional LIMIT (capped) / OFFSET.
pub fn select_tasks(schema: &str, user_id: i64, query: &TaskQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = vec![format!("{} = {}", quoted("user_id"), q.placeholder("user_id", user_id))];
    if let Some(completed) = query.completed {
        where_parts.push(format!("{} = {}", quoted("completed"), q.placeholder("completed", completed)));
    }
    let limit_clause = query
        .limit
        .map(|n| format!(" LIMIT {}", n.min(MAX_LIMIT)))
        .unwrap_or_default();
    let offset_clause = query
        .offset
        .filter(|n| *n > 0)
        .map(|n| format!(" OFFSET {}", n))
        .unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {}{}{}",
        task_column_list(),
        qualified_table(schema, "tasks"),
        where_parts.join(" AND "),
        quoted("id"),
        limit_clause,
        offset_clause
    );
    q
}

/// INSERT one task; `completed_at` is stamped when the task starts out completed.
pub fn insert_task(schema: &str, task: &NewTask) -> QueryBuf {
    let mut q = QueryBuf::new();
    let values = [
        q.placeholder("user_id", task.user_id),
        q.placeholder("title", task.title.as_str()),
        q.placeholder("description", task.description.as_deref()),
        q.placeholder("due_date", task.due_date.as_deref()),
        q.placeholder("priority", task.priority.as_str()),
    ];
    let completed = q.placeholder("completed", task.completed);
    q.sql = format!(
        "INSERT INTO {} ({}, {}, {}, {}, {}, {}, {}) VALUES ({}, {}, CASE WHEN {} THEN NOW() ELSE NULL END) RETURNING {}",
        qualified_table(schema, "tasks"),
        quoted("user_id"),
        quoted("title"),
        quoted("description"),
        quoted("due_date"),
        quoted("priority"),
        quoted("completed"),
        quoted("completed_at"),
        values.join(", "),
        completed,
        completed,
        task_column_list()
    );
    q
}

/// UPDATE by id: SET only the fields present in `changes`.
/// A completion change also maintains `completed_at`; the first completion time is kept while the task stays done.
/// With no changes this degrades to a SELECT by id.
pub fn update_task(schema: &str, id: i64, changes: &TaskChanges) -> QueryBuf {
    if changes.is_empty() {
        return select_task_by_id(schema, id);
    }
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    if let Some(title) = &changes.title {
        sets.push(format!("{} = {}", quoted("title"), q.placeholder("title", title.as_str())));
    }
    if let Some(description) = &changes.description {
        sets.push(format!(
            "{} = {}",
            quoted("description"),
            q.placeholder("description", description.as_deref())
        ));
    }
    if let Some(due_date) = &changes.due_date {
        sets.push(format!("{} = {}", quoted("due_date"), q.placeholder("due_date", due_date.as_deref())));
    }
    if let Some(priority) = changes.priority {
        sets.push(format!("{} = {}", quoted("priority"), q.placeholder("priority", priority.as_str())));
    }
    if let Some(completed) = changes.completed {
        let ph = q.placeholder("completed", completed);
        sets.push(format!("{} = {}", quoted("completed"), ph));
        sets.push(format!(
            "{col} = CASE WHEN {ph} THEN COALESCE({col}, NOW()) ELSE NULL END",
            col = quoted("completed_at"),
            ph = ph
        ));
    }
    let id_ph = q.placeholder("id", id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
        qualified_table(schema, "tasks"),
        sets.join(", "),
        quoted("id"),
        id_ph,
        task_column_list()
    );
    q
}

/// DELETE by id, returning the id when a row was removed.
pub fn delete_task(schema: &str, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.placeholder("id", id);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        qualified_table(schema, "tasks"),
        quoted("id"),
        ph,
        quoted("id")
    );
    q
}

/// DELETE a user's completed tasks whose completion time is at or before `cutoff`, in one statement.
pub fn delete_completed_before(schema: &str, user_id: i64, cutoff: DateTime<Utc>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let user_ph = q.placeholder("user_id", user_id);
    let cutoff_ph = q.placeholder("completed_at", cutoff);
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} AND {} AND {} IS NOT NULL AND {} <= {}",
        qualified_table(schema, "tasks"),
        quoted("user_id"),
        user_ph,
        quoted("completed"),
        quoted("completed_at"),
        quoted("completed_at"),
        cutoff_ph
    );
    q
}
