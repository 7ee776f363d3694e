#![allow(dead_code)] // OpenAPI doc stubs are only referenced by utoipa macros.

use crate::{
    handlers::sessions::SessionResponse,
    models::{
        AuthResponse, LoginRequest, RegisterRequest, SessionValidationResponse, UserResponse,
    },
};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        register_doc,
        login_doc,
        logout_doc,
        logout_all_doc,
        me_doc,
        refresh_doc,
        validate_doc,
        health_doc,
        list_sessions_doc,
        revoke_session_doc
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            UserResponse,
            SessionValidationResponse,
            SessionResponse
        )
    ),
    modifiers(&SecuritySchemes),
    tags(
        (name = "Auth", description = "Registration, login, and session lifecycle"),
        (name = "Sessions", description = "Listing and revoking active sessions")
    ),
    security(("SessionCookie" = []))
)]
pub struct ApiDoc;

struct SecuritySchemes;

impl Modify for SecuritySchemes {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("STOREFRONT_SESSION"))),
        );
        components.add_security_scheme(
            "SessionHeader",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Session-ID"))),
        );
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and session started", body = AuthResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth",
    security(())
)]
fn register_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials or disabled account")
    ),
    tag = "Auth",
    security(())
)]
fn login_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out; always succeeds", body = serde_json::Value)),
    tag = "Auth",
    security(())
)]
fn logout_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/logout-all",
    responses((status = 200, description = "All sessions for the user invalidated", body = serde_json::Value)),
    tag = "Auth"
)]
fn logout_all_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Currently authenticated user", body = UserResponse),
        (status = 401, description = "No valid session")
    ),
    tag = "Auth"
)]
fn me_doc() {}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "Session lifetime extended", body = serde_json::Value),
        (status = 401, description = "No valid session")
    ),
    tag = "Auth"
)]
fn refresh_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/validate",
    responses((status = 200, description = "Verdict on the presented session", body = SessionValidationResponse)),
    tag = "Auth",
    security(())
)]
fn validate_doc() {}

#[utoipa::path(
    get,
    path = "/api/auth/health",
    responses((status = 200, description = "Service is up", body = serde_json::Value)),
    tag = "Auth",
    security(())
)]
fn health_doc() {}

#[utoipa::path(
    get,
    path = "/api/sessions",
    responses(
        (status = 200, description = "Active sessions for the caller", body = Vec<SessionResponse>),
        (status = 401, description = "No valid session")
    ),
    tag = "Sessions"
)]
fn list_sessions_doc() {}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    params(("id" = String, Path, description = "Session id to revoke")),
    responses(
        (status = 200, description = "Session revoked", body = serde_json::Value),
        (status = 400, description = "Cannot revoke the current session"),
        (status = 403, description = "Session belongs to another user"),
        (status = 404, description = "Session not found")
    ),
    tag = "Sessions"
)]
fn revoke_session_doc() {}
