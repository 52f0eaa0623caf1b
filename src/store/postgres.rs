//! PostgreSQL-backed store: table DDL, database bootstrap, and row operations over a `PgPool`.

use crate::error::AppError;
use crate::model::{Credentials, NewTask, NewUser, Task, TaskChanges, TaskQuery, User};
use crate::sql::{self, qualified_table, QueryBuf};
use crate::store::TodoStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::error::ErrorKind;
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

const USER_COLUMNS: &str = "\"id\", \"username\", \"email\", \"created_at\"";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

impl PgStore {
    /// `schema` must be a valid identifier (see `ServerConfig`).
    pub fn new(pool: PgPool, schema: impl Into<String>) -> Self {
        Self {
            pool,
            schema: schema.into(),
        }
    }

    fn table(&self, name: &str) -> String {
        qualified_table(&self.schema, name)
    }

    /// Create the schema, `users` and `tasks` if missing. Safe to run on every start.
    pub async fn ensure_tables(&self) -> Result<(), AppError> {
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", sql::quoted(&self.schema)))
            .execute(&self.pool)
            .await?;

        let users = self.table("users");
        let users_ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            users
        );
        sqlx::query(&users_ddl).execute(&self.pool).await?;

        let tasks = self.table("tasks");
        let tasks_ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id BIGSERIAL PRIMARY KEY,
                user_id BIGINT NOT NULL REFERENCES {}(id) ON DELETE CASCADE,
                title TEXT NOT NULL CHECK (btrim(title) <> ''),
                description TEXT,
                due_date TEXT,
                priority TEXT NOT NULL DEFAULT 'Low',
                completed BOOLEAN NOT NULL DEFAULT FALSE,
                completed_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            tasks, users
        );
        sqlx::query(&tasks_ddl).execute(&self.pool).await?;
        // Tables created before completion timestamps existed lack the column.
        let alter_completed_at = format!("ALTER TABLE {} ADD COLUMN IF NOT EXISTS completed_at TIMESTAMPTZ", tasks);
        sqlx::query(&alter_completed_at).execute(&self.pool).await?;
        let index = format!(
            "CREATE INDEX IF NOT EXISTS tasks_user_id_idx ON {} (user_id, completed, id)",
            tasks
        );
        sqlx::query(&index).execute(&self.pool).await?;
        tracing::info!(schema = %self.schema, "tables ready");
        Ok(())
    }

    async fn fetch_tasks(&self, q: QueryBuf) -> Result<Vec<Task>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, Task>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn fetch_optional_task(&self, q: QueryBuf) -> Result<Option<Task>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query_as::<_, Task>(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        query.fetch_optional(&self.pool).await.map_err(map_write_error)
    }

    async fn execute(&self, q: QueryBuf) -> Result<u64, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(p.clone());
        }
        let result = query.execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}

/// Constraint violations become the same 4xx errors the service raises from its own checks.
fn map_write_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error() {
        match db.kind() {
            ErrorKind::UniqueViolation => return AppError::Conflict("username or email already exists".into()),
            ErrorKind::ForeignKeyViolation => {
                return AppError::Validation("user_id does not reference an existing user".into())
            }
            ErrorKind::CheckViolation => return AppError::Validation("title must not be empty".into()),
            _ => {}
        }
    }
    AppError::Db(e)
}

#[async_trait]
impl TodoStore for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO {} (\"username\", \"email\", \"password_hash\") VALUES ($1, $2, $3) RETURNING {}",
            self.table("users"),
            USER_COLUMNS
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn identity_taken(&self, username: &str, email: &str) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE \"username\" = $1 OR \"email\" = $2)",
            self.table("users")
        );
        let exists: (bool,) = sqlx::query_as(&sql)
            .bind(username)
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists.0)
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>, AppError> {
        let sql = format!(
            "SELECT {}, \"password_hash\" FROM {} WHERE \"username\" = $1",
            USER_COLUMNS,
            self.table("users")
        );
        Ok(sqlx::query_as::<_, Credentials>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE \"id\" = $1", USER_COLUMNS, self.table("users"));
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_tasks(&self, user_id: i64, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        self.fetch_tasks(sql::select_tasks(&self.schema, user_id, query)).await
    }

    async fn insert_task(&self, task: NewTask) -> Result<Task, AppError> {
        self.fetch_optional_task(sql::insert_task(&self.schema, &task))
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound))
    }

    async fn find_task(&self, id: i64) -> Result<Option<Task>, AppError> {
        self.fetch_optional_task(sql::select_task_by_id(&self.schema, id)).await
    }

    async fn update_task(&self, id: i64, changes: &TaskChanges) -> Result<Option<Task>, AppError> {
        self.fetch_optional_task(sql::update_task(&self.schema, id, changes)).await
    }

    async fn delete_task(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.execute(sql::delete_task(&self.schema, id)).await? > 0)
    }

    async fn delete_completed_before(&self, user_id: i64, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        self.execute(sql::delete_completed_before(&self.schema, user_id, cutoff)).await
    }
}

/// Connect to the server's `postgres` database and create the target database if it is missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = split_database_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", sql::quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

/// Split `postgres://host/db?opts` into (`postgres://host/postgres?opts`, `db`).
fn split_database_url(url: &str) -> Result<(String, String), AppError> {
    let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
    let path_start = url[scheme_end..]
        .find('/')
        .map(|i| scheme_end + i + 1)
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no database path".into()))?;
    let rest = &url[path_start..];
    let (db_name, query) = match rest.split_once('?') {
        Some((db, q)) => (db, Some(q)),
        None => (rest, None),
    };
    let mut admin_url = format!("{}postgres", &url[..path_start]);
    if let Some(q) = query {
        admin_url.push('?');
        admin_url.push_str(q);
    }
    Ok((admin_url, db_name.trim().to_string()))
}
