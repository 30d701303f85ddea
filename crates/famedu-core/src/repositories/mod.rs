//! Repository traits (ports)

pub mod activity_log_repository;
pub mod family_repository;
pub mod user_repository;

pub use activity_log_repository::ActivityLogRepository;
pub use family_repository::FamilyRepository;
pub use user_repository::{UserFilter, UserRepository};

#[cfg(test)]
pub use activity_log_repository::MockActivityLogRepository;
#[cfg(test)]
pub use family_repository::MockFamilyRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
