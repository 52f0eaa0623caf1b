//! Load configuration from environment variables (or any key lookup, for tests).

use crate::config::types::{ClientConfig, ServerConfig, StoreBackend};
use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

fn parse<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(v) if v.trim().is_empty() => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && s.len() <= 63
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            "memory" | "mem" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

impl ServerConfig {
    /// Read from process environment. Call `dotenvy::dotenv()` first to pick up `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = ServerConfig::default();
        let store = parse("TODO_STORE", lookup("TODO_STORE"), d.store)?;
        let database_url = match lookup("DATABASE_URL") {
            Some(url) if !url.trim().is_empty() => url,
            _ if store == StoreBackend::Postgres => return Err(ConfigError::Missing("DATABASE_URL")),
            _ => d.database_url,
        };
        let schema = lookup("TODO_SCHEMA").unwrap_or(d.schema);
        if !valid_identifier(&schema) {
            return Err(ConfigError::Invalid { key: "TODO_SCHEMA", value: schema });
        }
        let max_connections = parse("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"), d.max_connections)?;
        if max_connections == 0 {
            return Err(ConfigError::Invalid { key: "DB_MAX_CONNECTIONS", value: "0".into() });
        }
        Ok(Self {
            database_url,
            bind_addr: lookup("BIND_ADDR").unwrap_or(d.bind_addr),
            max_connections,
            schema,
            store,
            body_limit_bytes: parse("BODY_LIMIT_BYTES", lookup("BODY_LIMIT_BYTES"), d.body_limit_bytes)?,
        })
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = ClientConfig::default();
        let timeout_secs = parse("API_TIMEOUT_SECS", lookup("API_TIMEOUT_SECS"), d.timeout.as_secs())?;
        let sweep_secs = parse("SWEEP_INTERVAL_SECS", lookup("SWEEP_INTERVAL_SECS"), d.sweep_interval.as_secs())?;
        let tasks_per_page = parse("TASKS_PER_PAGE", lookup("TASKS_PER_PAGE"), d.tasks_per_page)?;
        if tasks_per_page == 0 {
            return Err(ConfigError::Invalid { key: "TASKS_PER_PAGE", value: "0".into() });
        }
        Ok(Self {
            base_url: lookup("API_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(d.base_url),
            timeout: Duration::from_secs(timeout_secs),
            tasks_per_page,
            sweep_interval: Duration::from_secs(sweep_secs.max(1)),
            sweep_retention_days: parse("SWEEP_RETENTION_DAYS", lookup("SWEEP_RETENTION_DAYS"), d.sweep_retention_days)?,
        })
    }
}
