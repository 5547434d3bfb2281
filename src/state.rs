use axum::http::HeaderName;
use std::sync::Arc;

use crate::application::services::RedirectService;

/// Request pipeline settings that do not belong to the matching engine.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Prefix stripped from request paths before matching.
    pub base_path: String,
    /// Header that switches a request into dry-run mode.
    pub tester_header: HeaderName,
    /// Value the tester header must carry.
    pub tester_header_value: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            tester_header: HeaderName::from_static("x-redirect-tester"),
            tester_header_value: "Tester".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub redirect_service: Arc<RedirectService>,
    pub pipeline: Arc<PipelineSettings>,
    /// Bearer token guarding `POST /_redirect/publish`; `None` disables the endpoint.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        redirect_service: Arc<RedirectService>,
        pipeline: PipelineSettings,
        admin_token: Option<String>,
    ) -> Self {
        Self {
            redirect_service,
            pipeline: Arc::new(pipeline),
            admin_token: admin_token.map(Arc::from),
        }
    }
}
