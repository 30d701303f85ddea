// ============================================================================
// FamEdu Core - Authentication Service
// File: crates/famedu-core/src/services/auth_service.rs
// ============================================================================
//! Authentication service: login with throttling, registration, token
//! refresh and password changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use famedu_security::{JwtService, LimitCheck, LoginAttemptTracker, PasswordService};
use famedu_shared::utils::{mask_username, normalize_username};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audit::ActivityLogger;
use crate::authz::{Permission, PermissionChecker, Principal};
use crate::domain::{ActivityAction, ActivityLog, Family, Role, User};
use crate::error::DomainError;
use crate::repositories::{FamilyRepository, UserRepository};
use crate::services::RequestContext;

/// Authentication service for handling login/register flows
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    families: Arc<dyn FamilyRepository>,
    tracker: LoginAttemptTracker,
    jwt: Arc<JwtService>,
    audit: ActivityLogger,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        families: Arc<dyn FamilyRepository>,
        tracker: LoginAttemptTracker,
        jwt: Arc<JwtService>,
        audit: ActivityLogger,
    ) -> Self {
        Self {
            users,
            families,
            tracker,
            jwt,
            audit,
        }
    }

    /// Login with username and password
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        ctx: &RequestContext,
    ) -> Result<LoginResult, DomainError> {
        let username = normalize_username(username);
        if username.is_empty() || password.is_empty() {
            return Err(DomainError::ValidationError(
                "Username and password are required".into(),
            ));
        }

        info!("Login attempt for {}", mask_username(&username));

        // 1. Throttle before touching the database
        if let LimitCheck::Locked { retry_after_minutes } = self.tracker.check_limits(&username) {
            self.audit.log(
                ActivityLog::builder(ActivityAction::LoginLocked)
                    .ip_address(ctx.ip_address)
                    .detail("username", username.as_str())
                    .detail("retry_after_minutes", retry_after_minutes)
                    .build(),
            );
            return Err(DomainError::AccountLocked { retry_after_minutes });
        }

        // 2. Find user
        let Some(user) = self.users.find_by_username(&username).await? else {
            PasswordService::verify_dummy(password);
            return Err(self.reject_login(&username, None, "unknown_user", ctx));
        };

        // 3. Verify password
        let password_valid = match PasswordService::verify(password, &user.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                error!("Stored password hash unreadable for user {}: {}", user.id, e);
                false
            }
        };
        if !password_valid {
            return Err(self.reject_login(&username, Some(user.id), "bad_password", ctx));
        }

        // 4. Correct password on a disabled account
        if !user.can_login() {
            warn!("Login refused: account {} is deactivated", user.id);
            self.audit.log(
                ActivityLog::builder(ActivityAction::LoginFailed)
                    .user(user.id)
                    .ip_address(ctx.ip_address)
                    .detail("reason", "inactive")
                    .build(),
            );
            return Err(DomainError::UserNotActive);
        }

        self.tracker.clear_failures(&username);

        // 5. Tokens
        let access_token = self
            .jwt
            .generate_access_token(&user.id)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;
        let refresh_token = self
            .jwt
            .generate_refresh_token(&user.id)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;

        // 6. Record login time, upgrading legacy hashes on the way
        let mut updated_user = user.clone();
        updated_user.record_login(Utc::now());
        if PasswordService::needs_rehash(&user.password_hash) {
            match PasswordService::hash(password) {
                Ok(hash) => updated_user.set_password_hash(hash),
                Err(e) => warn!("Could not upgrade legacy hash for {}: {}", user.id, e),
            }
        }
        let updated_user = match self.users.update(&updated_user).await {
            Ok(saved) => saved,
            Err(e) => {
                // Don't fail login for this
                error!("Failed to update last login for {}: {}", user.id, e);
                updated_user
            }
        };

        self.audit.log(
            ActivityLog::builder(ActivityAction::Login)
                .user(user.id)
                .ip_address(ctx.ip_address)
                .detail("user_agent", ctx.user_agent.clone().unwrap_or_default())
                .build(),
        );

        info!("Login successful for {}", mask_username(&username));

        Ok(LoginResult {
            user: UserInfo::from(&updated_user),
            access_token,
            refresh_token,
            expires_in: self.jwt.access_token_expiry(),
        })
    }

    /// Register a new family with its first parent account
    pub async fn register(
        &self,
        input: RegisterInput,
        ctx: &RequestContext,
    ) -> Result<RegisterResult, DomainError> {
        let username = normalize_username(&input.username);
        info!("Registration attempt for {}", mask_username(&username));

        // 1. Uniqueness
        if self.users.find_by_username(&username).await?.is_some() {
            warn!("Registration failed: username already exists: {}", username);
            return Err(DomainError::UsernameAlreadyExists(username));
        }
        if self.families.find_by_name(input.family_name.trim()).await?.is_some() {
            warn!("Registration failed: family already exists: {}", input.family_name);
            return Err(DomainError::FamilyNameAlreadyExists(input.family_name));
        }

        // 2. Password policy and hash
        PasswordService::check_strength(&input.password, &[&username, &input.display_name])?;
        let password_hash = PasswordService::hash(&input.password)?;

        // 3. Entities
        let family = Family::new(input.family_name, input.timezone)?;
        let user = User::new(
            &username,
            password_hash,
            &input.display_name,
            Role::Parent,
            Some(family.id),
            None,
        )?;

        // 4. Persist
        let family = self.families.create(&family).await?;
        let user = self.users.create(&user).await?;

        self.audit.log(
            ActivityLog::builder(ActivityAction::Register)
                .user(user.id)
                .resource("family", family.id)
                .ip_address(ctx.ip_address)
                .build(),
        );

        info!("Registration successful for {}", mask_username(&username));

        Ok(RegisterResult {
            user: UserInfo::from(&user),
            family,
        })
    }

    /// Issue a fresh access token from a refresh token
    pub async fn refresh(&self, refresh_token: &str) -> Result<RefreshResult, DomainError> {
        let claims = self
            .jwt
            .validate_refresh_token(refresh_token)
            .map_err(|e| DomainError::InvalidToken(e.to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|e| DomainError::InvalidToken(e.to_string()))?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| DomainError::InvalidToken("unknown subject".into()))?;
        if !user.can_login() {
            return Err(DomainError::UserNotActive);
        }

        let access_token = self
            .jwt
            .generate_access_token(&user.id)
            .map_err(|e| DomainError::TokenGenerationError(e.to_string()))?;

        Ok(RefreshResult {
            access_token,
            expires_in: self.jwt.access_token_expiry(),
        })
    }

    /// Resolves a bearer access token to the current user record.
    ///
    /// Role, family and active flag come from storage, not from the token,
    /// so changes apply on the next request.
    pub async fn authenticate(&self, access_token: &str) -> Result<User, DomainError> {
        let claims = self
            .jwt
            .validate_access_token(access_token)
            .map_err(|e| DomainError::InvalidToken(e.to_string()))?;
        let user_id = claims
            .user_id()
            .map_err(|e| DomainError::InvalidToken(e.to_string()))?;

        let user = self
            .users
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| DomainError::InvalidToken("unknown subject".into()))?;

        if !user.can_login() {
            warn!("Rejected token for deactivated user {}", user.id);
            return Err(DomainError::UserNotActive);
        }
        Ok(user)
    }

    /// Change own password after re-checking the current one
    pub async fn change_password(
        &self,
        principal: &Principal,
        current_password: &str,
        new_password: &str,
        ctx: &RequestContext,
    ) -> Result<(), DomainError> {
        let mut user = self
            .users
            .find_by_id(&principal.id)
            .await?
            .ok_or(DomainError::UserNotFound)?;

        // Re-entering the current password is an authentication attempt
        if let LimitCheck::Locked { retry_after_minutes } = self.tracker.check_limits(&user.username) {
            warn!("Password change for {} refused: account locked", user.id);
            return Err(DomainError::AccountLocked { retry_after_minutes });
        }

        let current_valid = match PasswordService::verify(current_password, &user.password_hash) {
            Ok(valid) => valid,
            Err(e) => {
                error!("Stored password hash unreadable for user {}: {}", user.id, e);
                false
            }
        };
        if !current_valid {
            return Err(self.reject_login(
                &user.username,
                Some(user.id),
                "bad_current_password",
                ctx,
            ));
        }
        self.tracker.clear_failures(&user.username);

        PasswordService::check_strength(new_password, &[&user.username, &user.display_name])?;
        user.set_password_hash(PasswordService::hash(new_password)?);
        self.users.update(&user).await?;

        self.audit.log(
            ActivityLog::builder(ActivityAction::PasswordChanged)
                .user(user.id)
                .resource("user", user.id)
                .ip_address(ctx.ip_address)
                .build(),
        );
        info!("Password changed for user {}", user.id);
        Ok(())
    }

    /// Tokens are stateless; logout only leaves an audit trail.
    pub fn logout(&self, principal: &Principal, ctx: &RequestContext) {
        self.audit.log(
            ActivityLog::builder(ActivityAction::Logout)
                .user(principal.id)
                .ip_address(ctx.ip_address)
                .build(),
        );
    }

    fn reject_login(
        &self,
        username: &str,
        user_id: Option<Uuid>,
        reason: &str,
        ctx: &RequestContext,
    ) -> DomainError {
        let attempts = self.tracker.record_failure(username);
        warn!(
            "Login failed for {} ({}), attempt {}",
            mask_username(username),
            reason,
            attempts
        );

        let mut entry = ActivityLog::builder(ActivityAction::LoginFailed)
            .ip_address(ctx.ip_address)
            .detail("username", username)
            .detail("reason", reason)
            .detail("attempts", attempts);
        if let Some(id) = user_id {
            entry = entry.user(id);
        }
        self.audit.log(entry.build());

        DomainError::InvalidCredentials
    }
}

/// Registration payload
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub family_name: String,
    pub timezone: Option<String>,
    pub username: String,
    pub password: String,
    pub display_name: String,
}

/// Result of successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub user: UserInfo,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
}

/// Result of successful registration
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResult {
    pub user: UserInfo,
    pub family: Family,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshResult {
    pub access_token: String,
    pub expires_in: i64,
}

/// User info returned in responses
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: Role,
    pub family_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_level: Option<i16>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            role: user.role,
            family_id: user.family_id,
            year_level: user.year_level,
            is_active: user.is_active,
            last_login_at: user.last_login_at,
        }
    }
}

/// Profile of the caller including the capabilities granted to them.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    #[serde(flatten)]
    pub user: UserInfo,
    pub permissions: Vec<Permission>,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            user: UserInfo::from(user),
            permissions: PermissionChecker::new(&user.principal()).granted(),
        }
    }
}
