//! Handler for requests no route or redirect rule claimed.

use serde_json::json;

use crate::error::AppError;

/// Terminal `404` for pass-through requests when the engine runs standalone.
pub async fn not_found_handler() -> AppError {
    AppError::not_found("Not Found", json!({}))
}
