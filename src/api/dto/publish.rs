//! DTOs for the publish endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::PublishReport;

/// Result of a publish.
///
/// # Example
///
/// ```json
/// {
///   "generation": "9f2c41d07a3be815",
///   "indexed": 41,
///   "skipped": [
///     { "rule_id": 12, "reason": "rule 12: invalid pattern: unclosed group" }
///   ],
///   "published_at": "2025-01-01T00:00:00Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct PublishResponse {
    pub generation: String,
    pub indexed: usize,
    pub skipped: Vec<SkippedRule>,
    pub published_at: DateTime<Utc>,
}

/// A rule left out of the published index.
#[derive(Debug, Serialize)]
pub struct SkippedRule {
    pub rule_id: i64,
    pub reason: String,
}

impl From<PublishReport> for PublishResponse {
    fn from(report: PublishReport) -> Self {
        Self {
            generation: report.generation,
            indexed: report.indexed,
            skipped: report
                .skipped
                .iter()
                .map(|e| SkippedRule {
                    rule_id: e.rule_id(),
                    reason: e.to_string(),
                })
                .collect(),
            published_at: report.published_at,
        }
    }
}
