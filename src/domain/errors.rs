//! Error taxonomy of the matching engine.
//!
//! None of these errors reach an HTTP client: rule errors are reported at
//! publish time, condition errors veto a single redirect.

/// A rule that could not be indexed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// Unknown kind, scheme or status code.
    #[error("rule {id}: configuration error: {reason}")]
    Configuration { id: i64, reason: String },

    /// Pattern that does not compile.
    #[error("rule {id}: invalid pattern: {reason}")]
    Match { id: i64, reason: String },
}

impl RuleError {
    pub fn rule_id(&self) -> i64 {
        match self {
            Self::Configuration { id, .. } | Self::Match { id, .. } => *id,
        }
    }
}

/// A condition that failed while evaluating a tentative match.
#[derive(Debug, Clone, thiserror::Error)]
#[error("condition '{condition}' failed: {reason}")]
pub struct ConditionError {
    pub condition: String,
    pub reason: String,
}

impl ConditionError {
    pub fn new(condition: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
            reason: reason.into(),
        }
    }
}
