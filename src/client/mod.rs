//! HTTP client for the REST API.

mod api;
mod error;
pub use api::ApiClient;
pub use error::ClientError;
