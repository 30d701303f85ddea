// ============================================================================
// FamEdu Core - User Entity
// File: crates/famedu-core/src/domain/user.rs
// Description: Student, parent and admin accounts
// ============================================================================

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use famedu_shared::utils::normalize_username;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::authz::{Principal, TargetUser};
use crate::domain::Role;

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9_.\-]*$").expect("username pattern compiles"));

/// User entity. Accounts are deactivated, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct User {
    pub id: Uuid,

    #[validate(
        length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"),
        regex(path = *USERNAME_PATTERN, message = "Username may only contain a-z, 0-9, '.', '_' and '-'")
    )]
    pub username: String,

    /// Argon2 (or legacy bcrypt) hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    #[validate(length(min = 1, max = 100, message = "Display name must be between 1 and 100 characters"))]
    pub display_name: String,

    pub role: Role,
    pub is_active: bool,
    pub family_id: Option<Uuid>,

    #[validate(range(min = 1, max = 12, message = "Year level must be between 1 and 12"))]
    pub year_level: Option<i16>,

    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates an active account. Year level is only kept for students.
    pub fn new(
        username: &str,
        password_hash: String,
        display_name: &str,
        role: Role,
        family_id: Option<Uuid>,
        year_level: Option<i16>,
    ) -> Result<Self, validator::ValidationErrors> {
        let now = Utc::now();
        let user = Self {
            id: Uuid::new_v4(),
            username: normalize_username(username),
            password_hash,
            display_name: display_name.trim().to_string(),
            role,
            is_active: true,
            family_id,
            year_level: if role == Role::Student { year_level } else { None },
            last_login_at: None,
            created_at: now,
            updated_at: now,
        };

        user.validate()?;
        Ok(user)
    }

    pub fn can_login(&self) -> bool {
        self.is_active
    }

    pub fn record_login(&mut self, at: DateTime<Utc>) {
        self.last_login_at = Some(at);
        self.updated_at = at;
    }

    pub fn set_password_hash(&mut self, hash: String) {
        self.password_hash = hash;
        self.updated_at = Utc::now();
    }

    pub fn set_active(&mut self, active: bool) {
        self.is_active = active;
        self.updated_at = Utc::now();
    }

    pub fn update_profile(
        &mut self,
        display_name: Option<&str>,
        year_level: Option<i16>,
    ) -> Result<(), validator::ValidationErrors> {
        if let Some(name) = display_name {
            self.display_name = name.trim().to_string();
        }
        if self.role == Role::Student && year_level.is_some() {
            self.year_level = year_level;
        }
        self.updated_at = Utc::now();
        self.validate()
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            role: self.role,
            family_id: self.family_id,
            is_active: self.is_active,
        }
    }

    pub fn as_target(&self) -> TargetUser {
        TargetUser {
            id: self.id,
            role: self.role,
            family_id: self.family_id,
        }
    }
}
