//! Family management

use std::sync::Arc;

use famedu_shared::constants::MAX_PAGE_SIZE;
use famedu_shared::Pagination;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::audit::ActivityLogger;
use crate::authz::{Permission, PermissionChecker, Principal};
use crate::domain::{ActivityAction, ActivityLog, Family};
use crate::error::DomainError;
use crate::repositories::{FamilyRepository, UserFilter, UserRepository};
use crate::services::{RequestContext, UserInfo};

/// A family together with its member accounts
#[derive(Debug, Clone, Serialize)]
pub struct FamilyDetails {
    #[serde(flatten)]
    pub family: Family,
    pub members: Vec<UserInfo>,
}

pub struct FamilyService {
    families: Arc<dyn FamilyRepository>,
    users: Arc<dyn UserRepository>,
    audit: ActivityLogger,
}

impl FamilyService {
    pub fn new(
        families: Arc<dyn FamilyRepository>,
        users: Arc<dyn UserRepository>,
        audit: ActivityLogger,
    ) -> Self {
        Self {
            families,
            users,
            audit,
        }
    }

    pub async fn create_family(
        &self,
        principal: &Principal,
        name: String,
        timezone: Option<String>,
        ctx: &RequestContext,
    ) -> Result<Family, DomainError> {
        PermissionChecker::new(principal).require(Permission::ManageFamilies)?;

        let family = Family::new(name, timezone)?;
        if self.families.find_by_name(&family.name).await?.is_some() {
            return Err(DomainError::FamilyNameAlreadyExists(family.name));
        }
        let family = self.families.create(&family).await?;

        self.audit.log(
            ActivityLog::builder(ActivityAction::FamilyCreated)
                .user(principal.id)
                .resource("family", family.id)
                .ip_address(ctx.ip_address)
                .build(),
        );
        info!("Family {} created by {}", family.id, principal.id);

        Ok(family)
    }

    pub async fn list_families(
        &self,
        principal: &Principal,
        pagination: Pagination,
    ) -> Result<Vec<Family>, DomainError> {
        PermissionChecker::new(principal).require(Permission::ManageFamilies)?;
        self.families.list(pagination).await
    }

    /// Admins read any family, members read their own.
    pub async fn get_family(&self, principal: &Principal, id: Uuid) -> Result<FamilyDetails, DomainError> {
        let checker = PermissionChecker::new(principal);
        if !checker.is_admin() && !checker.is_family_member(id) {
            return Err(DomainError::Forbidden);
        }

        let family = self
            .families
            .find_by_id(&id)
            .await?
            .ok_or(DomainError::FamilyNotFound)?;

        let filter = UserFilter {
            family_id: Some(family.id),
            ..Default::default()
        };
        let mut members = Vec::new();
        let mut page = 1;
        loop {
            let batch = self
                .users
                .list(&filter, Pagination::new(Some(page), Some(MAX_PAGE_SIZE)))
                .await?;
            let done = batch.len() < MAX_PAGE_SIZE as usize;
            members.extend(batch.iter().map(UserInfo::from));
            if done {
                break;
            }
            page += 1;
        }

        Ok(FamilyDetails { family, members })
    }
}
