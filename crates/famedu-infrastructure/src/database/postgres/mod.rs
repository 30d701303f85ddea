//! PostgreSQL repository implementations

pub mod activity_log_repo_impl;
pub mod family_repo_impl;
pub mod user_repo_impl;

pub use activity_log_repo_impl::PgActivityLogRepository;
pub use family_repo_impl::PgFamilyRepository;
pub use user_repo_impl::PgUserRepository;

use famedu_core::error::DomainError;
use tracing::error;

/// Maps a driver error, giving unique violations to the caller-supplied conflict.
pub(crate) fn map_db_error(
    context: &str,
    e: sqlx::Error,
    on_conflict: impl FnOnce() -> DomainError,
) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return on_conflict();
        }
    }
    error!("Database error {}: {}", context, e);
    DomainError::DatabaseError(e.to_string())
}
