//! Role based authorization

pub mod checker;
pub mod permission;

pub use checker::{PermissionChecker, Principal, TargetUser};
pub use permission::Permission;
