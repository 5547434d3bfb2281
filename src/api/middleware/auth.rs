//! Bearer token authentication for the admin endpoints.

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::Response,
};
use axum_auth::AuthBearer;
use sha2::{Digest, Sha256};

use crate::{error::AppError, state::AppState};

/// Authenticates requests against `ADMIN_TOKEN`.
///
/// # Header Format
///
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// # Errors
///
/// Returns `401 Unauthorized` if the header is missing or malformed, or the
/// token does not match. Returns `503 Service Unavailable` when no admin
/// token is configured.
///
/// # Example
///
/// ```rust,ignore
/// let admin = Router::new()
///     .route("/_redirect/publish", post(publish_handler))
///     .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));
/// ```
pub async fn layer(
    State(st): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = st.admin_token.as_deref() else {
        return Err(AppError::unavailable(
            "Admin endpoints are disabled",
            serde_json::json!({"reason": "ADMIN_TOKEN is not configured"}),
        ));
    };

    let (mut parts, body) = req.into_parts();

    let AuthBearer(token) = AuthBearer::from_request_parts(&mut parts, &())
        .await
        .map_err(|_| {
            AppError::unauthorized(
                "Unauthorized",
                serde_json::json!({"reason": "Authorization header is missing or invalid"}),
            )
        })?;

    if !tokens_match(&token, expected) {
        return Err(AppError::unauthorized(
            "Unauthorized",
            serde_json::json!({"reason": "Invalid token"}),
        ));
    }

    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Compares SHA-256 digests so the comparison time does not depend on the
/// position of the first differing byte of the raw token.
fn tokens_match(provided: &str, expected: &str) -> bool {
    let provided = Sha256::digest(provided.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    provided
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_match() {
        assert!(tokens_match("secret", "secret"));
        assert!(!tokens_match("secret", "Secret"));
        assert!(!tokens_match("", "secret"));
    }
}
