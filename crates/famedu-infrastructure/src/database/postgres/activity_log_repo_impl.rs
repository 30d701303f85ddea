// ============================================================================
// FamEdu Infrastructure - PostgreSQL Activity Log Repository
// File: crates/famedu-infrastructure/src/database/postgres/activity_log_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use sqlx::{PgPool, QueryBuilder};

use famedu_core::domain::ActivityLog;
use famedu_core::error::DomainError;
use famedu_core::repositories::ActivityLogRepository;

use super::map_db_error;

pub struct PgActivityLogRepository {
    pool: PgPool,
}

impl PgActivityLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityLogRepository for PgActivityLogRepository {
    async fn append_batch(&self, entries: &[ActivityLog]) -> Result<u64, DomainError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut query_builder = QueryBuilder::new(
            r#"
            INSERT INTO activity_logs (
                id, user_id, action, details,
                resource_type, resource_id, ip_address, created_at
            )
            "#,
        );

        query_builder.push_values(entries, |mut b, entry| {
            b.push_bind(entry.id)
                .push_bind(entry.user_id)
                .push_bind(entry.action.as_str())
                .push_bind(&entry.details)
                .push_bind(&entry.resource_type)
                .push_bind(&entry.resource_id)
                .push_bind(&entry.ip_address)
                .push_bind(entry.created_at);
        });

        let result = query_builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| {
                map_db_error("appending activity logs", e, || {
                    DomainError::DatabaseError("duplicate activity log id".into())
                })
            })?;

        Ok(result.rows_affected())
    }
}
