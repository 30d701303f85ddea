// ============================================================================
// FamEdu Core - Permission Checker
// File: crates/famedu-core/src/authz/checker.rs
// Description: Per-request allow/deny decisions for an authenticated user
// ============================================================================
//! Stateless permission evaluation.
//!
//! A checker is built from a [`Principal`] snapshot loaded for the current
//! request and dropped with it. Every operation answers with a boolean;
//! missing or ambiguous data (no family on either side, unknown key) denies.
//! Inactive principals must be rejected before a checker is built.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::authz::Permission;
use crate::domain::Role;
use crate::error::DomainError;

/// The authenticated user as seen by authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub family_id: Option<Uuid>,
    pub is_active: bool,
}

/// Identity of a user a request acts upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetUser {
    pub id: Uuid,
    pub role: Role,
    pub family_id: Option<Uuid>,
}

#[derive(Debug, Clone, Copy)]
pub struct PermissionChecker {
    principal: Principal,
}

impl PermissionChecker {
    pub fn new(principal: &Principal) -> Self {
        Self { principal: *principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.principal.role.grants(permission)
    }

    /// String-keyed lookup for callers holding a front-end permission key.
    /// Unknown keys deny.
    pub fn can_key(&self, key: &str) -> bool {
        Permission::from_key(key).is_some_and(|p| self.can(p))
    }

    pub fn is_admin(&self) -> bool {
        self.principal.role == Role::Admin
    }

    pub fn is_parent(&self) -> bool {
        self.principal.role == Role::Parent
    }

    pub fn is_student(&self) -> bool {
        self.principal.role == Role::Student
    }

    pub fn can_manage_users(&self) -> bool {
        self.can(Permission::ManageUsers)
    }

    /// Admins reset anyone, everyone resets themselves, parents reset
    /// non-admin members of their own family.
    pub fn can_reset_password(&self, target: &TargetUser) -> bool {
        self.can_edit_user(target)
    }

    /// Profile edits follow the password reset scope.
    pub fn can_edit_user(&self, target: &TargetUser) -> bool {
        self.is_admin() || self.is_self(target) || self.is_guardian_of(target)
    }

    /// Same scope as password resets: admin, self, or parent of the family.
    pub fn can_view_user(&self, target: &TargetUser) -> bool {
        self.is_admin() || self.is_self(target) || self.is_parent_of_family(target.family_id)
    }

    pub fn can_manage_family(&self, family_id: Uuid) -> bool {
        self.is_admin()
            || (self.can(Permission::ManageFamilyMembers) && self.is_parent_of_family(Some(family_id)))
    }

    pub fn is_family_member(&self, family_id: Uuid) -> bool {
        self.principal.family_id == Some(family_id)
    }

    /// Turns a denial into the error handlers return.
    pub fn require(&self, permission: Permission) -> Result<(), DomainError> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(DomainError::Forbidden)
        }
    }

    pub fn granted(&self) -> Vec<Permission> {
        self.principal.role.permissions()
    }

    fn is_self(&self, target: &TargetUser) -> bool {
        self.principal.id == target.id
    }

    /// A parent never holds write scope over an admin, even one filed
    /// under the same family.
    fn is_guardian_of(&self, target: &TargetUser) -> bool {
        target.role != Role::Admin && self.is_parent_of_family(target.family_id)
    }

    fn is_parent_of_family(&self, family_id: Option<Uuid>) -> bool {
        match (self.principal.family_id, family_id) {
            (Some(own), Some(other)) => self.is_parent() && own == other,
            _ => false,
        }
    }
}
