//! Endpoints for the account security page: list the caller's active
//! sessions and revoke one of them remotely.

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    middleware::CurrentSession,
    models::{Session, User},
    state::AppState,
};

/// One row in the session list shown to the account owner.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub is_current: bool,
}

impl SessionResponse {
    fn from_session(session: Session, current_id: &str) -> Self {
        let is_current = session.session_id == current_id;
        Self {
            session_id: session.session_id,
            ip_address: session.ip_address,
            user_agent: session.user_agent,
            created_at: session.created_at,
            expires_at: session.expires_at,
            last_accessed_at: session.last_accessed_at,
            is_current,
        }
    }
}

pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(CurrentSession(current)): Extension<CurrentSession>,
) -> Result<Json<Vec<SessionResponse>>, AppError> {
    let sessions = state.sessions.list_active(user.id).await?;
    let responses = sessions
        .into_iter()
        .map(|session| SessionResponse::from_session(session, &current.session_id))
        .collect();
    Ok(Json(responses))
}

/// Revokes one of the caller's other sessions. The current session must go
/// through logout so the cookie gets cleared as well.
pub async fn revoke_session(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Extension(CurrentSession(current)): Extension<CurrentSession>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    if session_id.trim().is_empty() {
        return Err(AppError::BadRequest("Session ID is required".to_string()));
    }

    let session = state
        .sessions
        .get(&session_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    if session.user_id != user.id {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }

    if session.session_id == current.session_id {
        return Err(AppError::BadRequest(
            "Cannot revoke current session; use logout instead".to_string(),
        ));
    }

    state.sessions.invalidate(&session_id).await?;

    Ok(Json(json!({
        "message": "Session revoked",
        "session_id": session_id
    })))
}
