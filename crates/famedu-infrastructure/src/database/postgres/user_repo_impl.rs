// ============================================================================
// FamEdu Infrastructure - PostgreSQL User Repository
// File: crates/famedu-infrastructure/src/database/postgres/user_repo_impl.rs
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::{info, warn};
use uuid::Uuid;

use famedu_core::domain::{Role, User};
use famedu_core::error::DomainError;
use famedu_core::repositories::{UserFilter, UserRepository};
use famedu_shared::Pagination;

use super::map_db_error;

const USER_COLUMNS: &str = "id, username, password_hash, display_name, role, is_active, \
     family_id, year_level, last_login_at, created_at, updated_at";

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    password_hash: String,
    display_name: String,
    role: String,
    is_active: bool,
    family_id: Option<Uuid>,
    year_level: Option<i16>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let role = row.role.parse::<Role>().unwrap_or_else(|_| {
            warn!("Unknown role '{}' on user {}, treating as student", row.role, row.id);
            Role::Student
        });

        User {
            id: row.id,
            username: row.username,
            password_hash: row.password_hash,
            display_name: row.display_name,
            role,
            is_active: row.is_active,
            family_id: row.family_id,
            year_level: row.year_level,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Appends `WHERE` clauses for the set fields of `filter`.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(role) = filter.role {
        builder.push(" AND role = ").push_bind(role.as_str());
    }
    if let Some(family_id) = filter.family_id {
        builder.push(" AND family_id = ").push_bind(family_id);
    }
    if let Some(is_active) = filter.is_active {
        builder.push(" AND is_active = ").push_bind(is_active);
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_db_error("finding user by id", e, || DomainError::UserNotFound))?;

        Ok(row.map(User::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER($1)"
        ))
        .bind(username.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_db_error("finding user by username", e, || DomainError::UserNotFound))?;

        Ok(row.map(User::from))
    }

    async fn list(&self, filter: &UserFilter, pagination: Pagination) -> Result<Vec<User>, DomainError> {
        let mut builder = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users"));
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY username LIMIT ")
            .push_bind(pagination.limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows: Vec<UserRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_db_error("listing users", e, || DomainError::UserNotFound))?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn count(&self, filter: &UserFilter) -> Result<i64, DomainError> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM users");
        push_filter(&mut builder, filter);

        let (total,): (i64,) = builder
            .build_query_as()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error("counting users", e, || DomainError::UserNotFound))?;

        Ok(total)
    }

    async fn create(&self, user: &User) -> Result<User, DomainError> {
        info!("Creating user {} with role {}", user.id, user.role);

        let row: UserRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (
                id, username, password_hash, display_name, role, is_active,
                family_id, year_level, last_login_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.is_active)
        .bind(user.family_id)
        .bind(user.year_level)
        .bind(user.last_login_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_db_error("creating user", e, || {
                DomainError::UsernameAlreadyExists(user.username.clone())
            })
        })?;

        Ok(row.into())
    }

    async fn update(&self, user: &User) -> Result<User, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r#"
            UPDATE users SET
                password_hash = $2,
                display_name = $3,
                is_active = $4,
                year_level = $5,
                last_login_at = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(user.is_active)
        .bind(user.year_level)
        .bind(user.last_login_at)
        .bind(user.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            map_db_error("updating user", e, || {
                DomainError::UsernameAlreadyExists(user.username.clone())
            })
        })?;

        row.map(User::from).ok_or(DomainError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(role: &str) -> UserRow {
        let now = Utc::now();
        UserRow {
            id: Uuid::new_v4(),
            username: "grace".into(),
            password_hash: "hash".into(),
            display_name: "Grace".into(),
            role: role.into(),
            is_active: true,
            family_id: None,
            year_level: Some(5),
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_row_maps_role() {
        assert_eq!(User::from(row("PARENT")).role, Role::Parent);
        assert_eq!(User::from(row("admin")).role, Role::Admin);
    }

    #[test]
    fn test_unknown_role_falls_back_to_least_privilege() {
        assert_eq!(User::from(row("SUPERUSER")).role, Role::Student);
    }

    #[test]
    fn test_filter_builds_bound_clauses() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM users");
        push_filter(
            &mut builder,
            &UserFilter {
                role: Some(Role::Student),
                family_id: Some(Uuid::new_v4()),
                is_active: None,
            },
        );
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM users WHERE 1 = 1 AND role = $1 AND family_id = $2"
        );
    }
}
