//! Normalized request signature used as matching input and cache key.

use crate::domain::entities::RequestScheme;
use crate::utils::path_normalizer::normalize_path;

/// The parts of an inbound request the engine looks at.
///
/// Query strings never take part in matching; they are carried only so the
/// executor can pass them through when configured to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestSignature {
    pub path: String,
    pub scheme: RequestScheme,
    pub query: Option<String>,
}

impl RequestSignature {
    /// Builds a signature from a raw request path.
    ///
    /// `base_path` must already be normalized with
    /// [`crate::utils::path_normalizer::normalize_base_path`].
    pub fn new(raw_path: &str, scheme: RequestScheme, query: Option<&str>, base_path: &str) -> Self {
        Self {
            path: normalize_path(raw_path, base_path),
            scheme,
            query: query.filter(|q| !q.is_empty()).map(str::to_string),
        }
    }

    /// Cache key for this signature (`scheme:path`).
    pub fn cache_key(&self) -> String {
        format!("{}:{}", self.scheme, self.path)
    }
}
