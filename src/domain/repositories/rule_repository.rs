//! Repository trait for redirect rule data access.

use crate::domain::entities::RuleRecord;
use crate::error::AppError;
use async_trait::async_trait;

/// Read-only view over persisted redirect rules.
///
/// Consulted only when the rule index is (re)built on publish, never per
/// request.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgRuleRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::persistence::JsonRuleRepository`] - JSON file implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Lists all stored rules, ordered by id.
    ///
    /// Records are returned unvalidated; kind, scheme and status are checked
    /// at publish time so one bad row cannot hide the others.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store cannot be read.
    async fn list_rules(&self) -> Result<Vec<RuleRecord>, AppError>;

    /// Checks that the store is reachable.
    async fn health_check(&self) -> bool;
}
