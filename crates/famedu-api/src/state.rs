use std::sync::Arc;

use famedu_core::services::{AuthService, FamilyService, UserService};

/// Services shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub families: Arc<FamilyService>,
    /// Whether `X-Forwarded-For` names the client. Off unless a trusted
    /// proxy sits in front.
    pub trust_forwarded_for: bool,
}
