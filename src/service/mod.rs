//! Business rules between the HTTP handlers and the store.

mod accounts;
mod tasks;
mod validation;
pub use accounts::AccountService;
pub use tasks::{TaskService, MAX_RETENTION_DAYS};
pub use validation::RequestValidator;
