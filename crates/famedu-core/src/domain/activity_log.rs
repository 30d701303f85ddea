//! Append-only audit trail entries

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Audited action categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityAction {
    Login,
    LoginFailed,
    LoginLocked,
    Logout,
    Register,
    PasswordChanged,
    PasswordReset,
    UserCreated,
    UserUpdated,
    UserActivated,
    UserDeactivated,
    FamilyCreated,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "LOGIN",
            Self::LoginFailed => "LOGIN_FAILED",
            Self::LoginLocked => "LOGIN_LOCKED",
            Self::Logout => "LOGOUT",
            Self::Register => "REGISTER",
            Self::PasswordChanged => "PASSWORD_CHANGED",
            Self::PasswordReset => "PASSWORD_RESET",
            Self::UserCreated => "USER_CREATED",
            Self::UserUpdated => "USER_UPDATED",
            Self::UserActivated => "USER_ACTIVATED",
            Self::UserDeactivated => "USER_DEACTIVATED",
            Self::FamilyCreated => "FAMILY_CREATED",
        }
    }
}

/// Complete activity log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: Uuid,
    /// Absent for attempts against unknown usernames
    pub user_id: Option<Uuid>,
    pub action: ActivityAction,
    pub details: Value,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ActivityLog {
    /// Create builder for fluent API
    pub fn builder(action: ActivityAction) -> ActivityLogBuilder {
        ActivityLogBuilder::new(action)
    }
}

/// Builder pattern for ActivityLog
pub struct ActivityLogBuilder {
    log: ActivityLog,
    details: Map<String, Value>,
}

impl ActivityLogBuilder {
    pub fn new(action: ActivityAction) -> Self {
        Self {
            log: ActivityLog {
                id: Uuid::new_v4(),
                user_id: None,
                action,
                details: Value::Null,
                resource_type: None,
                resource_id: None,
                ip_address: None,
                created_at: Utc::now(),
            },
            details: Map::new(),
        }
    }

    pub fn user(mut self, user_id: Uuid) -> Self {
        self.log.user_id = Some(user_id);
        self
    }

    pub fn resource(mut self, resource_type: &str, resource_id: impl ToString) -> Self {
        self.log.resource_type = Some(resource_type.to_string());
        self.log.resource_id = Some(resource_id.to_string());
        self
    }

    pub fn ip_address(mut self, ip: Option<IpAddr>) -> Self {
        self.log.ip_address = ip.map(|ip| ip.to_string());
        self
    }

    pub fn detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn build(mut self) -> ActivityLog {
        self.log.details = Value::Object(self.details);
        self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_details() {
        let user_id = Uuid::new_v4();
        let log = ActivityLog::builder(ActivityAction::PasswordReset)
            .user(user_id)
            .resource("user", user_id)
            .ip_address(Some("10.0.0.7".parse().unwrap()))
            .detail("by_admin", true)
            .build();

        assert_eq!(log.user_id, Some(user_id));
        assert_eq!(log.resource_type.as_deref(), Some("user"));
        assert_eq!(log.ip_address.as_deref(), Some("10.0.0.7"));
        assert_eq!(log.details["by_admin"], Value::Bool(true));
    }

    #[test]
    fn test_action_names_match_serde() {
        let json = serde_json::to_string(&ActivityAction::LoginFailed).unwrap();
        assert_eq!(json, format!("\"{}\"", ActivityAction::LoginFailed.as_str()));
    }
}
