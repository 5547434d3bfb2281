//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse, RuleStats};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: Rule store or cache unreachable
///
/// Redirects keep being served from the published snapshot while the rule
/// store is down; only publishing is affected.
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "rules": { "generation": "9f2c41d07a3be815", "indexed": 41, "active": 40, "skipped": 1 },
///   "checks": {
///     "rule_store": { "status": "ok", "message": "Reachable" },
///     "cache": { "status": "ok", "message": "memory" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let service = &state.redirect_service;
    let snapshot = service.snapshot().await;

    let rule_store = if service.repository().health_check().await {
        CheckStatus::ok("Reachable")
    } else {
        CheckStatus::error("Rule store unreachable")
    };

    let backend = service.cache().backend();
    let cache = if service.cache().health_check().await {
        CheckStatus::ok(backend)
    } else {
        CheckStatus::error(format!("{} cache unreachable", backend))
    };

    let all_healthy = rule_store.is_ok() && cache.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rules: RuleStats {
            generation: snapshot.generation.clone(),
            indexed: snapshot.rule_count(),
            active: snapshot.active_rule_count(Utc::now()),
            skipped: snapshot.skipped.len(),
        },
        checks: HealthChecks { rule_store, cache },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
