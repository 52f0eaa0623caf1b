//! Request extractors that reject with `AppError` so every failure uses the JSON error envelope.

mod json;
pub use json::ApiJson;
