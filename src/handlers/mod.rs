//! HTTP handlers for accounts and tasks.

pub mod tasks;
pub mod users;
pub use tasks::*;
pub use users::*;

use crate::error::AppError;

/// Path ids are positive integers; anything else is a 400 rather than axum's plain-text rejection.
pub(crate) fn parse_id(field: &str, id_str: &str) -> Result<i64, AppError> {
    match id_str.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(AppError::BadRequest(format!("invalid {}", field))),
    }
}
