//! # FamEdu Core - Domain Module
//! 
//! Domain entities for the family education platform.

pub mod activity_log;
pub mod family;
pub mod role;
pub mod user;

// Re-export all entities and enums
pub use activity_log::{ActivityAction, ActivityLog, ActivityLogBuilder};
pub use family::Family;
pub use role::{ParseRoleError, Role};
pub use user::User;
