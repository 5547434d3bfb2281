//! Handler for the publish endpoint.

use axum::{Json, extract::State};

use crate::api::dto::publish::PublishResponse;
use crate::error::AppError;
use crate::state::AppState;

/// Reloads rules from the store, swaps the index and clears the cache.
///
/// # Endpoint
///
/// `POST /_redirect/publish` (Bearer token required)
///
/// # Errors
///
/// Returns 500 if the rule store cannot be read. The previously published
/// rules stay in effect.
pub async fn publish_handler(
    State(state): State<AppState>,
) -> Result<Json<PublishResponse>, AppError> {
    let report = state.redirect_service.publish().await?;
    Ok(Json(report.into()))
}
