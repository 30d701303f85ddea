//! Activity log repository trait (port)

use async_trait::async_trait;

use crate::domain::ActivityLog;
use crate::error::DomainError;

/// Append-only sink. Nothing in the core reads entries back.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    /// Inserts the batch and returns how many rows were written.
    async fn append_batch(&self, entries: &[ActivityLog]) -> Result<u64, DomainError>;
}
