//! Models that represent user accounts and authentication payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::types::UserId;

/// Role granted to every newly registered account.
pub const DEFAULT_ROLE: &str = "user";

/// Database representation of a user account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    /// Unique identifier for the user.
    #[schema(value_type = String)]
    pub id: UserId,
    /// Email used for login; unique.
    pub email: String,
    /// Argon2 hash of the user's password.
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    /// Role names granted to the account.
    pub roles: Vec<String>,
    /// Disabled accounts cannot log in or receive new sessions.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Constructs a new active user with a freshly generated identifier
    /// and the default role.
    pub fn new(
        email: String,
        password_hash: String,
        first_name: String,
        last_name: String,
        phone: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            email,
            password_hash,
            first_name,
            last_name,
            phone,
            roles: vec![DEFAULT_ROLE.to_string()],
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Public-facing representation of a user returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id.to_string(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: user.phone,
            roles: user.roles,
            created_at: user.created_at,
        }
    }
}

/// Payload for creating a new account.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Credentials submitted by a user attempting to authenticate.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub password: String,
}

/// Returned after a successful registration or login. The session id is
/// also set as a cookie; it is echoed in the body for header-based clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub session_id: String,
    pub user: UserResponse,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of the non-failing session validation probe.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionValidationResponse {
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}
