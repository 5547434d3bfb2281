//! Admin route configuration.
//!
//! All admin endpoints require Bearer token authentication via
//! [`crate::api::middleware::auth`].

use crate::api::handlers::publish_handler;
use crate::state::AppState;
use axum::{Router, routing::post};

/// Admin routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `POST /_redirect/publish` - Reload rules and clear the match cache
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/_redirect/publish", post(publish_handler))
}
