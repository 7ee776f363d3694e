//! Registration, login, and session-backed identity lookup.

use std::sync::Arc;

use crate::models::{ClientInfo, LoginRequest, RegisterRequest, Session, User};
use crate::repositories::UserStore;
use crate::services::{SessionError, SessionService};
use crate::utils::{hash_password, verify_password};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown email and wrong password are indistinguishable on purpose.
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Email already registered")]
    EmailTaken,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("authentication backend failure")]
    Internal(#[source] anyhow::Error),
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<SessionService>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, sessions: Arc<SessionService>) -> Self {
        Self { users, sessions }
    }

    /// Creates an account and signs the new user in. The returned session
    /// is already persisted, so the caller only needs to hand out the id.
    pub async fn register(
        &self,
        request: RegisterRequest,
        client: ClientInfo,
    ) -> Result<(User, Session), AuthError> {
        tracing::info!(email = %request.email, "registering user");

        let taken = self
            .users
            .email_exists(&request.email)
            .await
            .map_err(AuthError::Internal)?;
        if taken {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = hash_password(&request.password).map_err(AuthError::Internal)?;
        let user = User::new(
            request.email,
            password_hash,
            request.first_name,
            request.last_name,
            request.phone,
        );
        let user = self.users.insert(&user).await.map_err(AuthError::Internal)?;

        let session = self.sessions.create(user.id, client).await?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok((user, session))
    }

    /// Verifies credentials and issues a session.
    pub async fn login(
        &self,
        request: LoginRequest,
        client: ClientInfo,
    ) -> Result<(User, Session), AuthError> {
        tracing::info!(email = %request.email, "login attempt");

        let user = self
            .users
            .find_by_email(&request.email)
            .await
            .map_err(AuthError::Internal)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !user.is_active {
            return Err(AuthError::AccountDisabled);
        }

        let matches = verify_password(&request.password, &user.password_hash)
            .map_err(AuthError::Internal)?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.sessions.create(user.id, client).await?;
        tracing::info!(user_id = %user.id, "login succeeded");
        Ok((user, session))
    }

    /// Resolves the user behind a session id, validating the session on
    /// the way. A valid session pointing at a missing user row means the
    /// data is inconsistent, not that the caller is unauthorized.
    pub async fn current_user(&self, session_id: &str) -> Result<User, AuthError> {
        let session = self.sessions.validate(session_id).await?;
        self.users
            .find_by_id(session.user_id)
            .await
            .map_err(AuthError::Internal)?
            .ok_or_else(|| {
                AuthError::Internal(anyhow::anyhow!(
                    "no user row for validated session {}",
                    session.session_id
                ))
            })
    }
}
