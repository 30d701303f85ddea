// ============================================================================
// FamEdu Infrastructure - PostgreSQL Family Repository
// File: crates/famedu-infrastructure/src/database/postgres/family_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use famedu_core::domain::Family;
use famedu_core::error::DomainError;
use famedu_core::repositories::FamilyRepository;
use famedu_shared::Pagination;

use super::map_db_error;

pub struct PgFamilyRepository {
    pool: PgPool,
}

impl PgFamilyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct FamilyRow {
    id: Uuid,
    name: String,
    timezone: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FamilyRow> for Family {
    fn from(row: FamilyRow) -> Self {
        Family {
            id: row.id,
            name: row.name,
            timezone: row.timezone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl FamilyRepository for PgFamilyRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Family>, DomainError> {
        let row: Option<FamilyRow> = sqlx::query_as(
            "SELECT id, name, timezone, created_at, updated_at FROM families WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding family by id", e, || DomainError::FamilyNotFound))?;

        Ok(row.map(Family::from))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Family>, DomainError> {
        let row: Option<FamilyRow> = sqlx::query_as(
            "SELECT id, name, timezone, created_at, updated_at FROM families WHERE LOWER(name) = LOWER($1)",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding family by name", e, || DomainError::FamilyNotFound))?;

        Ok(row.map(Family::from))
    }

    async fn list(&self, pagination: Pagination) -> Result<Vec<Family>, DomainError> {
        let rows: Vec<FamilyRow> = sqlx::query_as(
            r#"
            SELECT id, name, timezone, created_at, updated_at
            FROM families
            ORDER BY name
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_db_error("listing families", e, || DomainError::FamilyNotFound))?;

        Ok(rows.into_iter().map(Family::from).collect())
    }

    async fn create(&self, family: &Family) -> Result<Family, DomainError> {
        info!("Creating family {}", family.id);

        let row: FamilyRow = sqlx::query_as(
            r#"
            INSERT INTO families (id, name, timezone, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, timezone, created_at, updated_at
            "#,
        )
        .bind(family.id)
        .bind(&family.name)
        .bind(&family.timezone)
        .bind(family.created_at)
        .bind(family.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_db_error("creating family", e, || {
                DomainError::FamilyNameAlreadyExists(family.name.clone())
            })
        })?;

        Ok(row.into())
    }
}
