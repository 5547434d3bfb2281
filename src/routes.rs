//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`             - Health check: rule store, cache, published rules (public)
//! - `POST /_redirect/publish`  - Reload rules (Bearer token required)
//! - everything else            - Redirect pipeline in front of the site router
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging, outermost
//! - **Redirect** - Rule matching; only wraps the site so rules cannot shadow
//!   the engine's own endpoints
//! - **Authentication** - Bearer token on admin routes

use crate::api;
use crate::api::handlers::{health_handler, not_found_handler};
use crate::api::middleware::{auth, redirect, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};

/// Constructs the application router.
///
/// `site` is the service the redirect pipeline fronts; requests that no rule
/// claims are forwarded to it unmodified.
pub fn app_router(state: AppState, site: Router) -> Router {
    let admin_router = api::routes::protected_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    let site = site.layer(middleware::from_fn_with_state(
        state.clone(),
        redirect::layer,
    ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(admin_router)
        .with_state(state)
        .fallback_service(site)
        .layer(tracing::layer())
}

/// Site used when the engine runs standalone: every pass-through is a `404`.
pub fn default_site() -> Router {
    Router::new().fallback(not_found_handler)
}
