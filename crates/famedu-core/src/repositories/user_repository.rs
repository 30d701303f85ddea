//! User repository trait (port)

use async_trait::async_trait;
use famedu_shared::Pagination;
use uuid::Uuid;

use crate::domain::{Role, User};
use crate::error::DomainError;

/// Optional listing constraints; `None` fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<Role>,
    pub family_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<User>, DomainError>;
    /// Case-insensitive match on the normalized username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;
    async fn list(&self, filter: &UserFilter, pagination: Pagination) -> Result<Vec<User>, DomainError>;
    async fn count(&self, filter: &UserFilter) -> Result<i64, DomainError>;
    async fn create(&self, user: &User) -> Result<User, DomainError>;
    async fn update(&self, user: &User) -> Result<User, DomainError>;
}
