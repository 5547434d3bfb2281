//! Rule repository backed by a JSON file.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::warn;

use crate::domain::entities::RuleRecord;
use crate::domain::errors::RuleError;
use crate::domain::repositories::RuleRepository;
use crate::error::AppError;

/// Reads rules from a JSON array of [`RuleRecord`]s.
///
/// The file is re-read on every publish, so editing it and publishing is
/// enough to roll out changes without a database. A record that does not
/// deserialize is logged and left out; only a file that is not a JSON array
/// fails the read.
///
/// ```json
/// [
///   { "id": 1, "kind": "exact", "pattern": "/about", "target": "/about-us" },
///   { "id": 2, "kind": "regex", "pattern": "^/old/(\\d+)$", "target": "/new/$1", "status_code": 302 }
/// ]
/// ```
pub struct JsonRuleRepository {
    path: PathBuf,
}

impl JsonRuleRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the file, returning the usable records sorted by id and one
    /// [`RuleError::Configuration`] per record that could not be decoded.
    pub async fn load(&self) -> Result<(Vec<RuleRecord>, Vec<RuleError>), AppError> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            AppError::internal(
                "Failed to read rule file",
                json!({ "path": self.path.display().to_string(), "reason": e.to_string() }),
            )
        })?;

        let values: Vec<Value> = serde_json::from_str(&raw).map_err(|e| {
            AppError::internal(
                "Failed to parse rule file",
                json!({ "path": self.path.display().to_string(), "reason": e.to_string() }),
            )
        })?;

        let mut rules = Vec::with_capacity(values.len());
        let mut rejected = Vec::new();
        for value in values {
            let id = value.get("id").and_then(Value::as_i64).unwrap_or_default();
            match serde_json::from_value::<RuleRecord>(value) {
                Ok(record) => rules.push(record),
                Err(e) => {
                    let error = RuleError::Configuration {
                        id,
                        reason: e.to_string(),
                    };
                    warn!(path = %self.path.display(), %error, "Skipping unreadable rule record");
                    rejected.push(error);
                }
            }
        }

        rules.sort_by_key(|r| r.id);
        Ok((rules, rejected))
    }
}

#[async_trait]
impl RuleRepository for JsonRuleRepository {
    async fn list_rules(&self) -> Result<Vec<RuleRecord>, AppError> {
        let (rules, _) = self.load().await?;
        Ok(rules)
    }

    async fn health_check(&self) -> bool {
        tokio::fs::metadata(&self.path).await.is_ok()
    }
}
