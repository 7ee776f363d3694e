//! HTTP handlers for registration, login, and session lifecycle endpoints.
//!
//! Successful register/login responses set the session cookie and also echo
//! the session id in the body so header-based clients can store it.

use anyhow::anyhow;
use axum::{
    extract::{Extension, State},
    http::{header, header::USER_AGENT, HeaderMap, HeaderValue, StatusCode},
    Json,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    error::AppError,
    middleware::{extract_session_id, CurrentSession},
    models::{
        AuthResponse, ClientInfo, LoginRequest, RegisterRequest, SessionValidationResponse, User,
        UserResponse,
    },
    state::AppState,
    utils::{build_clear_cookie, build_session_cookie, CookieOptions},
};

pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<AuthResponse>), AppError> {
    payload.validate()?;

    let (user, session) = state.auth.register(payload, client_info(&headers)).await?;

    let response_headers = session_cookie_headers(&state, &session.session_id)?;
    let body = AuthResponse {
        session_id: session.session_id,
        user: UserResponse::from(user),
        message: "Registration successful".to_string(),
        expires_at: session.expires_at,
    };

    Ok((StatusCode::CREATED, response_headers, Json(body)))
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<AuthResponse>), AppError> {
    payload.validate()?;

    let (user, session) = state.auth.login(payload, client_info(&headers)).await?;

    let response_headers = session_cookie_headers(&state, &session.session_id)?;
    let body = AuthResponse {
        session_id: session.session_id,
        user: UserResponse::from(user),
        message: "Login successful".to_string(),
        expires_at: session.expires_at,
    };

    Ok((response_headers, Json(body)))
}

/// Logs out whatever session the request carries. A missing or unknown
/// session id is not an error; the client ends up logged out either way.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<(HeaderMap, Json<Value>), AppError> {
    let mut response_headers = HeaderMap::new();

    if let Some(session_id) = extract_session_id(&headers, &state.config.session_cookie_name) {
        state.sessions.invalidate(&session_id).await?;
        response_headers.insert(header::SET_COOKIE, clear_cookie_value(&state)?);
    }

    Ok((
        response_headers,
        Json(json!({ "message": "Logged out successfully" })),
    ))
}

pub async fn logout_all(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<(HeaderMap, Json<Value>), AppError> {
    state.sessions.invalidate_all(user.id).await?;

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, clear_cookie_value(&state)?);

    Ok((
        response_headers,
        Json(json!({ "message": "All sessions logged out successfully" })),
    ))
}

pub async fn me(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

/// Extends the current session and re-issues the cookie with a fresh
/// max-age. The session id itself never changes on refresh.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(CurrentSession(session)): Extension<CurrentSession>,
) -> Result<(HeaderMap, Json<Value>), AppError> {
    state.sessions.refresh(&session.session_id).await?;

    let response_headers = session_cookie_headers(&state, &session.session_id)?;
    Ok((
        response_headers,
        Json(json!({ "message": "Session refreshed successfully" })),
    ))
}

/// Non-failing probe for frontends deciding what to render. Always answers
/// 200; the `valid` flag carries the verdict.
pub async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<SessionValidationResponse> {
    let Some(session_id) = extract_session_id(&headers, &state.config.session_cookie_name) else {
        return Json(SessionValidationResponse {
            valid: false,
            message: "No session found".to_string(),
            user: None,
        });
    };

    match state.auth.current_user(&session_id).await {
        Ok(user) => Json(SessionValidationResponse {
            valid: true,
            message: "Session is valid".to_string(),
            user: Some(UserResponse::from(user)),
        }),
        Err(_) => Json(SessionValidationResponse {
            valid: false,
            message: "Invalid or expired session".to_string(),
            user: None,
        }),
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({ "message": "Auth service is running" }))
}

fn session_cookie_headers(state: &AppState, session_id: &str) -> Result<HeaderMap, AppError> {
    let cookie = build_session_cookie(
        &state.config.session_cookie_name,
        session_id,
        state.config.cookie_max_age(),
        cookie_options(state),
    );
    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie_header_value(cookie)?);
    Ok(headers)
}

fn clear_cookie_value(state: &AppState) -> Result<HeaderValue, AppError> {
    cookie_header_value(build_clear_cookie(
        &state.config.session_cookie_name,
        cookie_options(state),
    ))
}

fn cookie_options(state: &AppState) -> CookieOptions {
    CookieOptions {
        secure: state.config.cookie_secure,
        same_site: state.config.cookie_same_site,
    }
}

fn cookie_header_value(cookie: String) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&cookie)
        .map_err(|e| AppError::InternalServerError(anyhow!("cookie not header-safe: {e}")))
}

fn client_info(headers: &HeaderMap) -> ClientInfo {
    ClientInfo {
        ip_address: extract_ip(headers),
        user_agent: extract_user_agent(headers),
    }
}

fn extract_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        return value
            .split(',')
            .next()
            .map(|ip| ip.trim().to_string())
            .filter(|ip| !ip.is_empty());
    }
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|agent| agent.trim().to_string())
        .filter(|agent| !agent.is_empty())
}
