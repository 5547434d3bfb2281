//! PostgreSQL implementation of the rule repository.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::RuleRecord;
use crate::domain::repositories::RuleRepository;
use crate::error::AppError;

/// PostgreSQL repository for redirect rules (`redirect_rules` table).
pub struct PgRuleRepository {
    pool: Arc<PgPool>,
}

impl PgRuleRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RuleRepository for PgRuleRepository {
    async fn list_rules(&self) -> Result<Vec<RuleRecord>, AppError> {
        let rows = sqlx::query_as::<_, RuleRecord>(
            r#"
            SELECT id, kind, pattern, target, scheme, status_code, enabled, from_date, to_date
            FROM redirect_rules
            ORDER BY id
            "#,
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await
            .is_ok()
    }
}
