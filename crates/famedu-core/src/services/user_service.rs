// ============================================================================
// FamEdu Core - User Service
// File: crates/famedu-core/src/services/user_service.rs
// ============================================================================
//! Account management scoped by the caller's role and family.

use std::sync::Arc;

use famedu_security::{LoginAttemptTracker, PasswordService};
use famedu_shared::utils::normalize_username;
use famedu_shared::{Page, Pagination};
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::ActivityLogger;
use crate::authz::{Permission, PermissionChecker, Principal};
use crate::domain::{ActivityAction, ActivityLog, Role, User};
use crate::error::DomainError;
use crate::repositories::{FamilyRepository, UserFilter, UserRepository};
use crate::services::{RequestContext, UserInfo};

#[derive(Debug, Clone, Default)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
    pub family_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct CreateUserInput {
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub role: Role,
    pub family_id: Option<Uuid>,
    pub year_level: Option<i16>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    pub display_name: Option<String>,
    pub year_level: Option<i16>,
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    families: Arc<dyn FamilyRepository>,
    tracker: LoginAttemptTracker,
    audit: ActivityLogger,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        families: Arc<dyn FamilyRepository>,
        tracker: LoginAttemptTracker,
        audit: ActivityLogger,
    ) -> Self {
        Self {
            users,
            families,
            tracker,
            audit,
        }
    }

    /// Admins see everyone; parents see their own family only.
    pub async fn list_users(
        &self,
        principal: &Principal,
        query: ListUsersQuery,
    ) -> Result<Page<UserInfo>, DomainError> {
        let checker = PermissionChecker::new(principal);
        let mut filter = UserFilter {
            role: query.role,
            family_id: query.family_id,
            is_active: query.is_active,
        };

        if !checker.is_admin() {
            match (checker.is_parent(), principal.family_id) {
                (true, Some(own)) => filter.family_id = Some(own),
                _ => return Err(DomainError::Forbidden),
            }
        }

        let pagination = Pagination::new(query.page, query.per_page);
        let users = self.users.list(&filter, pagination).await?;
        let total = self.users.count(&filter).await?;

        Ok(Page::new(users, total, pagination).map(|u| UserInfo::from(&u)))
    }

    pub async fn get_user(&self, principal: &Principal, id: Uuid) -> Result<UserInfo, DomainError> {
        let checker = PermissionChecker::new(principal);
        let user = self.load_target(&checker, id).await?;
        if !checker.can_view_user(&user.as_target()) {
            return Err(DomainError::Forbidden);
        }
        Ok(UserInfo::from(&user))
    }

    /// Admins create any role anywhere; parents add students to their own family.
    pub async fn create_user(
        &self,
        principal: &Principal,
        input: CreateUserInput,
        ctx: &RequestContext,
    ) -> Result<UserInfo, DomainError> {
        let checker = PermissionChecker::new(principal);

        let family_id = if checker.is_admin() {
            input.family_id
        } else if checker.can(Permission::ManageFamilyMembers) && input.role == Role::Student {
            match (principal.family_id, input.family_id) {
                (Some(own), None) => Some(own),
                (Some(own), Some(requested)) if own == requested => Some(own),
                _ => return Err(DomainError::Forbidden),
            }
        } else {
            return Err(DomainError::Forbidden);
        };

        if let Some(id) = family_id {
            if self.families.find_by_id(&id).await?.is_none() {
                return Err(DomainError::FamilyNotFound);
            }
        }

        let username = normalize_username(&input.username);
        if self.users.find_by_username(&username).await?.is_some() {
            return Err(DomainError::UsernameAlreadyExists(username));
        }

        PasswordService::check_strength(&input.password, &[&username, &input.display_name])?;
        let password_hash = PasswordService::hash(&input.password)?;

        let user = User::new(
            &username,
            password_hash,
            &input.display_name,
            input.role,
            family_id,
            input.year_level,
        )?;
        let user = self.users.create(&user).await?;

        self.audit.log(
            ActivityLog::builder(ActivityAction::UserCreated)
                .user(principal.id)
                .resource("user", user.id)
                .ip_address(ctx.ip_address)
                .detail("role", user.role.as_str())
                .build(),
        );
        info!("User {} created by {}", user.id, principal.id);

        Ok(UserInfo::from(&user))
    }

    pub async fn update_profile(
        &self,
        principal: &Principal,
        id: Uuid,
        input: UpdateProfileInput,
        ctx: &RequestContext,
    ) -> Result<UserInfo, DomainError> {
        let checker = PermissionChecker::new(principal);
        let mut user = self.load_target(&checker, id).await?;
        if !checker.can_edit_user(&user.as_target()) {
            return Err(DomainError::Forbidden);
        }

        user.update_profile(input.display_name.as_deref(), input.year_level)?;
        let user = self.users.update(&user).await?;

        self.audit.log(
            ActivityLog::builder(ActivityAction::UserUpdated)
                .user(principal.id)
                .resource("user", user.id)
                .ip_address(ctx.ip_address)
                .build(),
        );

        Ok(UserInfo::from(&user))
    }

    /// Sets a new password without the old one. Also lifts any lockout.
    pub async fn reset_password(
        &self,
        principal: &Principal,
        id: Uuid,
        new_password: &str,
        ctx: &RequestContext,
    ) -> Result<(), DomainError> {
        let checker = PermissionChecker::new(principal);
        let mut user = self.load_target(&checker, id).await?;
        if !checker.can_reset_password(&user.as_target()) {
            warn!("Password reset of {} denied for {}", id, principal.id);
            return Err(DomainError::Forbidden);
        }

        PasswordService::check_strength(new_password, &[&user.username, &user.display_name])?;
        user.set_password_hash(PasswordService::hash(new_password)?);
        self.users.update(&user).await?;
        self.tracker.clear_failures(&user.username);

        self.audit.log(
            ActivityLog::builder(ActivityAction::PasswordReset)
                .user(principal.id)
                .resource("user", user.id)
                .ip_address(ctx.ip_address)
                .build(),
        );
        info!("Password of {} reset by {}", user.id, principal.id);
        Ok(())
    }

    /// Activates or deactivates an account. Admin only.
    pub async fn set_active(
        &self,
        principal: &Principal,
        id: Uuid,
        active: bool,
        ctx: &RequestContext,
    ) -> Result<UserInfo, DomainError> {
        let checker = PermissionChecker::new(principal);
        checker.require(Permission::ManageUsers)?;

        if principal.id == id && !active {
            return Err(DomainError::ValidationError(
                "Cannot deactivate your own account".into(),
            ));
        }

        let mut user = self
            .users
            .find_by_id(&id)
            .await?
            .ok_or(DomainError::UserNotFound)?;
        user.set_active(active);
        let user = self.users.update(&user).await?;

        let action = if active {
            ActivityAction::UserActivated
        } else {
            ActivityAction::UserDeactivated
        };
        self.audit.log(
            ActivityLog::builder(action)
                .user(principal.id)
                .resource("user", user.id)
                .ip_address(ctx.ip_address)
                .build(),
        );
        info!("User {} set active={} by {}", user.id, active, principal.id);

        Ok(UserInfo::from(&user))
    }

    /// Missing targets are only reported as missing to admins.
    async fn load_target(&self, checker: &PermissionChecker, id: Uuid) -> Result<User, DomainError> {
        match self.users.find_by_id(&id).await? {
            Some(user) => Ok(user),
            None if checker.is_admin() => Err(DomainError::UserNotFound),
            None => Err(DomainError::Forbidden),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditLoggerConfig;
    use crate::domain::Family;
    use crate::repositories::{MockActivityLogRepository, MockFamilyRepository, MockUserRepository};
    use famedu_security::LockoutPolicy;

    const STRONG: &str = "wombat-lantern-harbour";

    fn audit() -> ActivityLogger {
        let mut repo = MockActivityLogRepository::new();
        repo.expect_append_batch()
            .returning(|entries| Ok(entries.len() as u64));
        ActivityLogger::new(Arc::new(repo), AuditLoggerConfig::default())
    }

    fn user(name: &str, role: Role, family_id: Option<Uuid>) -> User {
        User::new(name, "hash".into(), name, role, family_id, Some(4)).unwrap()
    }

    fn admin() -> Principal {
        user("root", Role::Admin, None).principal()
    }

    fn service_with(users: Vec<User>, tracker: LoginAttemptTracker) -> UserService {
        let mut repo = MockUserRepository::new();
        let by_id = users.clone();
        repo.expect_find_by_id()
            .returning(move |id| Ok(by_id.iter().find(|u| u.id == *id).cloned()));
        let by_name = users.clone();
        repo.expect_find_by_username()
            .returning(move |name| Ok(by_name.iter().find(|u| u.username == name).cloned()));
        repo.expect_update().returning(|u| Ok(u.clone()));
        repo.expect_create().returning(|u| Ok(u.clone()));
        let listed = users.clone();
        repo.expect_list().returning(move |filter, _| {
            Ok(listed
                .iter()
                .filter(|u| filter.family_id.is_none() || u.family_id == filter.family_id)
                .cloned()
                .collect())
        });
        let counted = users;
        repo.expect_count().returning(move |filter| {
            Ok(counted
                .iter()
                .filter(|u| filter.family_id.is_none() || u.family_id == filter.family_id)
                .count() as i64)
        });

        let mut families = MockFamilyRepository::new();
        families.expect_find_by_id().returning(|id| {
            let mut family = Family::new("Known".into(), None).unwrap();
            family.id = *id;
            Ok(Some(family))
        });

        UserService::new(Arc::new(repo), Arc::new(families), tracker, audit())
    }

    fn service(users: Vec<User>) -> UserService {
        service_with(users, LoginAttemptTracker::new(LockoutPolicy::default()))
    }

    #[tokio::test]
    async fn test_parent_lists_only_own_family() {
        let f1 = Some(Uuid::new_v4());
        let f2 = Some(Uuid::new_v4());
        let parent = user("mum", Role::Parent, f1);
        let kid = user("kid", Role::Student, f1);
        let stranger = user("other", Role::Student, f2);
        let service = service(vec![parent.clone(), kid, stranger]);

        let page = service
            .list_users(
                &parent.principal(),
                ListUsersQuery {
                    family_id: f2,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|u| u.family_id == f1));
    }

    #[tokio::test]
    async fn test_student_cannot_list_users() {
        let kid = user("kid", Role::Student, Some(Uuid::new_v4()));
        let service = service(vec![kid.clone()]);
        let result = service.list_users(&kid.principal(), ListUsersQuery::default()).await;
        assert!(matches!(result, Err(DomainError::Forbidden)));
    }

    #[tokio::test]
    async fn test_missing_user_hidden_from_non_admins() {
        let parent = user("mum", Role::Parent, Some(Uuid::new_v4()));
        let service = service(vec![parent.clone()]);
        let missing = Uuid::new_v4();

        assert!(matches!(
            service.get_user(&parent.principal(), missing).await,
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(
            service.get_user(&admin(), missing).await,
            Err(DomainError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_parent_reset_password_scoped_to_family() {
        let f1 = Some(Uuid::new_v4());
        let parent = user("mum", Role::Parent, f1);
        let kid = user("kid", Role::Student, f1);
        let stranger = user("other", Role::Student, Some(Uuid::new_v4()));
        let service = service(vec![parent.clone(), kid.clone(), stranger.clone()]);
        let ctx = RequestContext::default();

        assert!(service
            .reset_password(&parent.principal(), kid.id, STRONG, &ctx)
            .await
            .is_ok());
        assert!(matches!(
            service
                .reset_password(&parent.principal(), stranger.id, STRONG, &ctx)
                .await,
            Err(DomainError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_parent_cannot_take_over_admin_in_family() {
        let f1 = Some(Uuid::new_v4());
        let mum = user("mum", Role::Parent, f1);
        let boss = user("boss", Role::Admin, f1);
        let service = service(vec![mum.clone(), boss.clone()]);
        let ctx = RequestContext::default();

        assert!(matches!(
            service
                .reset_password(&mum.principal(), boss.id, STRONG, &ctx)
                .await,
            Err(DomainError::Forbidden)
        ));
        let rename = UpdateProfileInput {
            display_name: Some("Pwned".into()),
            year_level: None,
        };
        assert!(matches!(
            service.update_profile(&mum.principal(), boss.id, rename, &ctx).await,
            Err(DomainError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_student_cannot_reset_sibling() {
        let f1 = Some(Uuid::new_v4());
        let kid = user("kid", Role::Student, f1);
        let sibling = user("sib", Role::Student, f1);
        let service = service(vec![kid.clone(), sibling.clone()]);

        let result = service
            .reset_password(&kid.principal(), sibling.id, STRONG, &RequestContext::default())
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden)));
    }

    #[tokio::test]
    async fn test_reset_password_lifts_lockout() {
        let kid = user("kid", Role::Student, Some(Uuid::new_v4()));
        let tracker = LoginAttemptTracker::new(LockoutPolicy::default());
        for _ in 0..5 {
            tracker.record_failure("kid");
        }
        assert!(!tracker.check_limits("kid").is_allowed());

        let service = service_with(vec![kid.clone()], tracker.clone());
        service
            .reset_password(&admin(), kid.id, STRONG, &RequestContext::default())
            .await
            .unwrap();
        assert!(tracker.check_limits("kid").is_allowed());
    }

    #[tokio::test]
    async fn test_reset_password_rejects_weak_password() {
        let kid = user("kid", Role::Student, Some(Uuid::new_v4()));
        let service = service(vec![kid.clone()]);
        let result = service
            .reset_password(&admin(), kid.id, "password", &RequestContext::default())
            .await;
        assert!(matches!(result, Err(DomainError::PasswordTooWeak)));
    }

    #[tokio::test]
    async fn test_parent_creates_student_in_own_family_only() {
        let f1 = Some(Uuid::new_v4());
        let parent = user("mum", Role::Parent, f1);
        let service = service(vec![parent.clone()]);
        let ctx = RequestContext::default();

        let input = CreateUserInput {
            username: "NewKid".into(),
            password: STRONG.into(),
            display_name: "New Kid".into(),
            role: Role::Student,
            family_id: None,
            year_level: Some(3),
        };
        let created = service
            .create_user(&parent.principal(), input.clone(), &ctx)
            .await
            .unwrap();
        assert_eq!(created.username, "newkid");
        assert_eq!(created.family_id, f1);
        assert_eq!(created.year_level, Some(3));

        let as_parent = CreateUserInput {
            role: Role::Parent,
            ..input.clone()
        };
        assert!(matches!(
            service.create_user(&parent.principal(), as_parent, &ctx).await,
            Err(DomainError::Forbidden)
        ));

        let elsewhere = CreateUserInput {
            family_id: Some(Uuid::new_v4()),
            ..input
        };
        assert!(matches!(
            service.create_user(&parent.principal(), elsewhere, &ctx).await,
            Err(DomainError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_username() {
        let existing = user("taken", Role::Student, None);
        let service = service(vec![existing]);
        let result = service
            .create_user(
                &admin(),
                CreateUserInput {
                    username: "Taken".into(),
                    password: STRONG.into(),
                    display_name: "Dup".into(),
                    role: Role::Student,
                    family_id: None,
                    year_level: None,
                },
                &RequestContext::default(),
            )
            .await;
        assert!(matches!(result, Err(DomainError::UsernameAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_set_active_admin_only_and_not_self() {
        let root = user("root", Role::Admin, None);
        let kid = user("kid", Role::Student, Some(Uuid::new_v4()));
        let parent = user("mum", Role::Parent, kid.family_id);
        let service = service(vec![root.clone(), kid.clone(), parent.clone()]);
        let ctx = RequestContext::default();

        let info = service.set_active(&root.principal(), kid.id, false, &ctx).await.unwrap();
        assert!(!info.is_active);

        assert!(matches!(
            service.set_active(&parent.principal(), kid.id, false, &ctx).await,
            Err(DomainError::Forbidden)
        ));
        assert!(matches!(
            service.set_active(&root.principal(), root.id, false, &ctx).await,
            Err(DomainError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_update_profile_validates_year_level() {
        let kid = user("kid", Role::Student, Some(Uuid::new_v4()));
        let service = service(vec![kid.clone()]);
        let ctx = RequestContext::default();

        let updated = service
            .update_profile(
                &kid.principal(),
                kid.id,
                UpdateProfileInput {
                    display_name: Some("Kiddo".into()),
                    year_level: Some(7),
                },
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(updated.display_name, "Kiddo");
        assert_eq!(updated.year_level, Some(7));

        let result = service
            .update_profile(
                &kid.principal(),
                kid.id,
                UpdateProfileInput {
                    display_name: None,
                    year_level: Some(13),
                },
                &ctx,
            )
            .await;
        assert!(matches!(result, Err(DomainError::ValidationError(_))));
    }
}
