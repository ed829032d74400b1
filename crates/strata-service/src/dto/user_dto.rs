//! User DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strata_core::validation::rules::password_complexity;
use strata_core::{User, UserId};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request to create a user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    /// At least 8 characters with a letter and a digit.
    #[validate(custom(function = "password_complexity"))]
    pub password: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub first_name: String,

    #[serde(default)]
    #[validate(length(max = 150))]
    pub last_name: String,

    #[serde(default)]
    pub is_authority: bool,

    #[validate(range(min = 300, max = 3600))]
    pub access_expiration_delta: Option<u32>,
}

/// Partial profile update; absent fields stay unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(max = 150))]
    pub first_name: Option<String>,

    #[validate(length(max = 150))]
    pub last_name: Option<String>,

    pub two_factor: Option<bool>,

    #[validate(range(min = 300, max = 3600))]
    pub access_expiration_delta: Option<u32>,

    #[validate(length(max = 255))]
    pub profile_picture: Option<String>,
}

/// Request to change a password.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SetPasswordRequest {
    #[validate(custom(function = "password_complexity"))]
    pub password: String,
}

/// User as exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub username: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// `"{first_name} {last_name}"`, trimmed.
    pub name: String,
    pub two_factor: bool,
    pub access_expiration_delta: u32,
    pub profile_picture: Option<String>,
    pub is_authority: bool,
    pub inactive: bool,
    pub deleted: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub last_pass_change: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            name: user.name(),
            two_factor: user.two_factor,
            access_expiration_delta: user.access_expiration_delta,
            profile_picture: user.profile_picture.clone(),
            is_authority: user.is_authority,
            inactive: user.audit.inactive,
            deleted: user.audit.deleted,
            last_login: user.last_login,
            last_pass_change: user.last_pass_change,
            created_at: user.audit.created_at,
            updated_at: user.audit.updated_at,
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

/// One page of users.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    pub users: Vec<UserResponse>,
    pub page: usize,
    pub size: usize,
    pub total_elements: u64,
    pub total_pages: u64,
}

impl From<strata_core::Page<UserResponse>> for UserListResponse {
    fn from(page: strata_core::Page<UserResponse>) -> Self {
        Self {
            page: page.info.page,
            size: page.info.size,
            total_elements: page.info.total_elements,
            total_pages: page.info.total_pages,
            users: page.content,
        }
    }
}
