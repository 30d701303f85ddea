//! Family repository trait (port)

use async_trait::async_trait;
use famedu_shared::Pagination;
use uuid::Uuid;

use crate::domain::Family;
use crate::error::DomainError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FamilyRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<Family>, DomainError>;
    async fn find_by_name(&self, name: &str) -> Result<Option<Family>, DomainError>;
    async fn list(&self, pagination: Pagination) -> Result<Vec<Family>, DomainError>;
    async fn create(&self, family: &Family) -> Result<Family, DomainError>;
}
