// ============================================================================
// FamEdu Core - Permission Table
// File: crates/famedu-core/src/authz/permission.rs
// Description: Capabilities and the static role -> capability table
// ============================================================================

use serde::{Serialize, Serializer};

use crate::domain::Role;

/// Named capabilities gated by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    // Administration
    ManageUsers,
    ManageFamilies,
    ViewActivityLogs,
    ImportContent,

    // Family supervision
    ManageFamilyMembers,
    ViewFamilyProgress,
    AssignHomework,
    GradeHomework,
    ManageVocabulary,
    ManageRewards,

    // Learning
    StudyVocabulary,
    SubmitHomework,
    PracticeExercises,
    ReviewMistakes,
    RedeemRewards,
}

impl Permission {
    pub const ALL: [Permission; 15] = [
        Permission::ManageUsers,
        Permission::ManageFamilies,
        Permission::ViewActivityLogs,
        Permission::ImportContent,
        Permission::ManageFamilyMembers,
        Permission::ViewFamilyProgress,
        Permission::AssignHomework,
        Permission::GradeHomework,
        Permission::ManageVocabulary,
        Permission::ManageRewards,
        Permission::StudyVocabulary,
        Permission::SubmitHomework,
        Permission::PracticeExercises,
        Permission::ReviewMistakes,
        Permission::RedeemRewards,
    ];

    /// Key used by the front end, e.g. `canManageUsers`.
    pub fn key(&self) -> &'static str {
        match self {
            Permission::ManageUsers => "canManageUsers",
            Permission::ManageFamilies => "canManageFamilies",
            Permission::ViewActivityLogs => "canViewActivityLogs",
            Permission::ImportContent => "canImportContent",
            Permission::ManageFamilyMembers => "canManageFamilyMembers",
            Permission::ViewFamilyProgress => "canViewFamilyProgress",
            Permission::AssignHomework => "canAssignHomework",
            Permission::GradeHomework => "canGradeHomework",
            Permission::ManageVocabulary => "canManageVocabulary",
            Permission::ManageRewards => "canManageRewards",
            Permission::StudyVocabulary => "canStudyVocabulary",
            Permission::SubmitHomework => "canSubmitHomework",
            Permission::PracticeExercises => "canPracticeExercises",
            Permission::ReviewMistakes => "canReviewMistakes",
            Permission::RedeemRewards => "canRedeemRewards",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    pub fn is_admin_only(&self) -> bool {
        !Role::Parent.grants(*self) && !Role::Student.grants(*self)
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl Role {
    /// The role -> capability table. Exhaustive so a new permission or role
    /// does not compile until it is placed.
    pub fn grants(&self, permission: Permission) -> bool {
        use Permission::*;

        match self {
            Role::Admin => true,
            Role::Parent => match permission {
                ManageFamilyMembers | ViewFamilyProgress | AssignHomework | GradeHomework
                | ManageVocabulary | ManageRewards | StudyVocabulary | PracticeExercises => true,
                ManageUsers | ManageFamilies | ViewActivityLogs | ImportContent | SubmitHomework
                | ReviewMistakes | RedeemRewards => false,
            },
            Role::Student => match permission {
                StudyVocabulary | SubmitHomework | PracticeExercises | ReviewMistakes
                | RedeemRewards => true,
                ManageUsers | ManageFamilies | ViewActivityLogs | ImportContent
                | ManageFamilyMembers | ViewFamilyProgress | AssignHomework | GradeHomework
                | ManageVocabulary | ManageRewards => false,
            },
        }
    }

    pub fn permissions(&self) -> Vec<Permission> {
        Permission::ALL.into_iter().filter(|p| self.grants(*p)).collect()
    }
}
