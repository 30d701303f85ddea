//! Request and response bodies

use famedu_core::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 2, max = 100, message = "Family name must be between 2 and 100 characters"))]
    pub family_name: String,
    pub timezone: Option<String>,
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Display name is required"))]
    pub display_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"))]
    pub username: String,
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Display name is required"))]
    pub display_name: String,
    pub role: Role,
    pub family_id: Option<Uuid>,
    #[validate(range(min = 1, max = 12, message = "Year level must be between 1 and 12"))]
    pub year_level: Option<i16>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "Display name must be between 1 and 100 characters"))]
    pub display_name: Option<String>,
    #[validate(range(min = 1, max = 12, message = "Year level must be between 1 and 12"))]
    pub year_level: Option<i16>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFamilyRequest {
    #[validate(length(min = 2, max = 100, message = "Family name must be between 2 and 100 characters"))]
    pub name: String,
    pub timezone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersParams {
    pub role: Option<String>,
    pub family_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListUsersParams {
    pub fn role(&self) -> Result<Option<Role>, ApiError> {
        self.role
            .as_deref()
            .map(|r| r.parse::<Role>().map_err(|e| ApiError::BadRequest(e.to_string())))
            .transpose()
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_params_role_parsing() {
        let params = ListUsersParams {
            role: Some("parent".into()),
            ..Default::default()
        };
        assert_eq!(params.role().unwrap(), Some(Role::Parent));

        let bad = ListUsersParams {
            role: Some("tutor".into()),
            ..Default::default()
        };
        assert!(bad.role().is_err());
        assert_eq!(ListUsersParams::default().role().unwrap(), None);
    }

    #[test]
    fn test_create_user_year_level_range() {
        let request: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "username": "kid",
            "password": "x",
            "display_name": "Kid",
            "role": "STUDENT",
            "year_level": 13
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }
}
