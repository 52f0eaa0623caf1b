//! Runtime configuration for the server and the client SDK.

use std::time::Duration;

/// Which `TodoStore` implementation the server runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    /// In-process tables; data is lost on restart.
    Memory,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub max_connections: u32,
    /// Schema holding the `users` and `tasks` tables. Must be a valid PostgreSQL identifier.
    pub schema: String,
    pub store: StoreBackend,
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "postgres://localhost/todo_app".into(),
            bind_addr: "0.0.0.0:5000".into(),
            max_connections: 15,
            schema: "todo".into(),
            store: StoreBackend::Postgres,
            body_limit_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL including the `/api` prefix, e.g. `http://localhost:5000/api`.
    pub base_url: String,
    pub timeout: Duration,
    pub tasks_per_page: usize,
    pub sweep_interval: Duration,
    pub sweep_retention_days: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".into(),
            timeout: Duration::from_secs(30),
            tasks_per_page: 10,
            sweep_interval: Duration::from_secs(60 * 60),
            sweep_retention_days: 7,
        }
    }
}
