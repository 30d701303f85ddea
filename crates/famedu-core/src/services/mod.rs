//! Domain services (business logic)

pub mod auth_service;
pub mod context;
pub mod family_service;
pub mod user_service;

pub use auth_service::{AuthService, CurrentUser, LoginResult, RefreshResult, RegisterInput, RegisterResult, UserInfo};
pub use context::RequestContext;
pub use family_service::{FamilyDetails, FamilyService};
pub use user_service::{CreateUserInput, ListUsersQuery, UpdateProfileInput, UserService};
