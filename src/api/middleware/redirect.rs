//! Redirect pipeline middleware.
//!
//! Sits in front of every route. A request either leaves here as a redirect
//! or continues unmodified to the inner service.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};

use crate::application::services::{Resolution, ResolveMode};
use crate::domain::entities::RequestScheme;
use crate::domain::location::RedirectResponse;
use crate::domain::signature::RequestSignature;
use crate::state::AppState;

pub const MATCH_HEADER: HeaderName = HeaderName::from_static("x-redirect-match");
pub const LOCATION_HEADER: HeaderName = HeaderName::from_static("x-redirect-location");
pub const STATUS_HEADER: HeaderName = HeaderName::from_static("x-redirect-status");
pub const VETOED_HEADER: HeaderName = HeaderName::from_static("x-redirect-vetoed");

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Resolves the request against the published rules.
///
/// # Flow
///
/// 1. Only `GET`, `POST` and `HEAD` are considered
/// 2. The path is normalized into a [`RequestSignature`]
/// 3. The redirect service matches it (cached) and runs the conditions
/// 4. A match that passes every condition is answered with its redirect
///
/// Everything else passes through to `next`.
///
/// # Dry run
///
/// When the tester header carries the configured value, the request is
/// matched without touching the cache or the event bus and always passes
/// through. The would-be redirect is described in `X-Redirect-Match`,
/// `X-Redirect-Location` and `X-Redirect-Status` response headers
/// (`X-Redirect-Vetoed` names the vetoing condition).
///
/// # Failure
///
/// Fail-open: a redirect that cannot be expressed as an HTTP response is
/// logged and the request is forwarded unmodified.
pub async fn layer(State(st): State<AppState>, req: Request, next: Next) -> Response {
    if !is_redirectable(req.method()) {
        return next.run(req).await;
    }

    let mode = if is_tester(req.headers(), &st) {
        ResolveMode::DryRun
    } else {
        ResolveMode::Live
    };

    let signature = RequestSignature::new(
        req.uri().path(),
        request_scheme(&req),
        req.uri().query(),
        &st.pipeline.base_path,
    );

    let resolution = st.redirect_service.resolve(&signature, mode).await;

    if mode == ResolveMode::DryRun {
        let mut response = next.run(req).await;
        describe(response.headers_mut(), &resolution);
        return response;
    }

    match resolution {
        Resolution::Redirect { rule_id, response } => match redirect(&response) {
            Some(redirect) => {
                debug!(rule_id, path = %signature.path, status = response.status_code, "Redirecting");
                redirect
            }
            None => {
                error!(
                    rule_id,
                    path = %signature.path,
                    location = ?response.location,
                    "Redirect could not be built, passing through"
                );
                next.run(req).await
            }
        },
        Resolution::Vetoed { rule_id, condition } => {
            debug!(rule_id, condition, path = %signature.path, "Redirect vetoed");
            next.run(req).await
        }
        Resolution::NoMatch => next.run(req).await,
    }
}

fn is_redirectable(method: &Method) -> bool {
    method == Method::GET || method == Method::POST || method == Method::HEAD
}

fn is_tester(headers: &HeaderMap, st: &AppState) -> bool {
    headers
        .get(&st.pipeline.tester_header)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == st.pipeline.tester_header_value)
}

/// Scheme from the absolute request URI, then `X-Forwarded-Proto`, else `http`.
fn request_scheme(req: &Request) -> RequestScheme {
    if let Some(scheme) = req.uri().scheme_str().and_then(|s| s.parse().ok()) {
        return scheme;
    }

    req.headers()
        .get(X_FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.parse().ok())
        .unwrap_or(RequestScheme::Http)
}

fn redirect(response: &RedirectResponse) -> Option<Response> {
    let status = StatusCode::from_u16(response.status_code).ok()?;
    let mut builder = Response::builder().status(status);

    if let Some(location) = &response.location {
        let value = HeaderValue::from_str(location).ok()?;
        builder = builder.header(header::LOCATION, value);
    }

    builder.body(Body::empty()).ok()
}

fn describe(headers: &mut HeaderMap, resolution: &Resolution) {
    match resolution {
        Resolution::NoMatch => {
            headers.insert(MATCH_HEADER, HeaderValue::from_static("none"));
        }
        Resolution::Vetoed { rule_id, condition } => {
            headers.insert(MATCH_HEADER, HeaderValue::from(*rule_id));
            if let Ok(value) = HeaderValue::from_str(condition) {
                headers.insert(VETOED_HEADER, value);
            }
        }
        Resolution::Redirect { rule_id, response } => {
            headers.insert(MATCH_HEADER, HeaderValue::from(*rule_id));
            headers.insert(STATUS_HEADER, HeaderValue::from(response.status_code));
            if let Some(value) = response
                .location
                .as_deref()
                .and_then(|l| HeaderValue::from_str(l).ok())
            {
                headers.insert(LOCATION_HEADER, value);
            }
        }
    }
}
