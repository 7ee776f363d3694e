use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};
use storefront_auth::models::SessionStatus;
use tower::ServiceExt;

mod support;

use support::{extract_set_cookie_value, raw_set_cookie, response_json, TestApp, COOKIE_NAME};

fn register_payload(email: &str) -> Value {
    json!({
        "email": email,
        "password": "correct horse battery",
        "first_name": "Alice",
        "last_name": "Example"
    })
}

async fn register_user(app: &TestApp, email: &str) -> (String, Value) {
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(register_payload(email).to_string()))
                .expect("build request"),
        )
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let session_id = extract_set_cookie_value(response.headers(), COOKIE_NAME)
        .expect("register sets the session cookie");
    let body = response_json(response).await;
    (session_id, body)
}

async fn login_user(app: &TestApp, email: &str, password: &str) -> (StatusCode, Value, Option<String>) {
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "email": email, "password": password }).to_string(),
                ))
                .expect("build request"),
        )
        .await
        .expect("send request");
    let status = response.status();
    let cookie = extract_set_cookie_value(response.headers(), COOKIE_NAME);
    let body = response_json(response).await;
    (status, body, cookie)
}

async fn get_me(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("send request");
    let status = response.status();
    let body = response_json(response).await;
    (status, body)
}

#[tokio::test]
async fn register_creates_account_and_sets_session_cookie() {
    let app = support::test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::USER_AGENT, "storefront-web/2.4")
                .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
                .body(Body::from(register_payload("alice@example.com").to_string()))
                .expect("build request"),
        )
        .await
        .expect("send request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let raw = raw_set_cookie(response.headers(), COOKIE_NAME).expect("session cookie");
    assert!(raw.contains("HttpOnly"));
    assert!(raw.contains("SameSite=Lax"));
    assert!(raw.contains("Path=/"));
    assert!(raw.contains("Max-Age=1800"));
    assert!(!raw.contains("Secure"));

    let cookie_id = extract_set_cookie_value(response.headers(), COOKIE_NAME).expect("cookie id");
    let body = response_json(response).await;
    assert_eq!(body["message"], "Registration successful");
    assert_eq!(body["session_id"], cookie_id.as_str());
    assert_eq!(cookie_id.len(), 64);
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["roles"][0], "user");
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["expires_at"].is_string());

    let stored = app.session_store.get(&cookie_id).expect("session row");
    assert_eq!(stored.status, SessionStatus::Active);
    assert_eq!(stored.ip_address.as_deref(), Some("203.0.113.7"));
    assert_eq!(stored.user_agent.as_deref(), Some("storefront-web/2.4"));
}

#[tokio::test]
async fn register_rejects_invalid_payload() {
    let app = support::test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "email": "not-an-email",
                        "password": "short",
                        "first_name": "",
                        "last_name": "Example"
                    })
                    .to_string(),
                ))
                .expect("build request"),
        )
        .await
        .expect("send request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let errors = body["details"]["errors"]
        .as_array()
        .expect("validation details");
    assert!(errors.len() >= 3);
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = support::test_app();
    register_user(&app, "alice@example.com").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(register_payload("alice@example.com").to_string()))
                .expect("build request"),
        )
        .await
        .expect("send request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = response_json(response).await;
    assert_eq!(body["error"], "Email already registered");
}

#[tokio::test]
async fn login_returns_a_fresh_session() {
    let app = support::test_app();
    let (register_session, _) = register_user(&app, "alice@example.com").await;

    let (status, body, cookie) =
        login_user(&app, "alice@example.com", "correct horse battery").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");

    let login_session = cookie.expect("login sets the session cookie");
    assert_ne!(login_session, register_session);
    assert_eq!(body["session_id"], login_session.as_str());
}

#[tokio::test]
async fn login_rejects_bad_credentials_uniformly() {
    let app = support::test_app();
    register_user(&app, "alice@example.com").await;

    // Wrong password and unknown email produce the same answer.
    let (status, body, cookie) = login_user(&app, "alice@example.com", "wrong password!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
    assert!(cookie.is_none());

    let (status, body, _) = login_user(&app, "nobody@example.com", "whatever password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid email or password");
}

#[tokio::test]
async fn me_accepts_cookie_or_header_session() {
    let app = support::test_app();
    let (session_id, _) = register_user(&app, "alice@example.com").await;

    let (status, body) = get_me(
        &app,
        Request::builder()
            .uri("/api/auth/me")
            .header(header::COOKIE, format!("{COOKIE_NAME}={session_id}"))
            .body(Body::empty())
            .expect("build request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");

    let (status, body) = get_me(
        &app,
        Request::builder()
            .uri("/api/auth/me")
            .header("x-session-id", session_id.clone())
            .body(Body::empty())
            .expect("build request"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "alice@example.com");

    let (status, body) = get_me(
        &app,
        Request::builder()
            .uri("/api/auth/me")
            .body(Body::empty())
            .expect("build request"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "No session provided");
}

#[tokio::test]
async fn refresh_extends_the_session_and_reissues_the_cookie() {
    let app = support::test_app();
    let (session_id, _) = register_user(&app, "alice@example.com").await;
    let before = app
        .session_store
        .get(&session_id)
        .expect("session row")
        .expires_at;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/refresh")
                .header(header::COOKIE, format!("{COOKIE_NAME}={session_id}"))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("send request");

    assert_eq!(response.status(), StatusCode::OK);
    let reissued = extract_set_cookie_value(response.headers(), COOKIE_NAME)
        .expect("refresh re-issues the cookie");
    assert_eq!(reissued, session_id);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Session refreshed successfully");

    let after = app.session_store.get(&session_id).expect("session row");
    assert!(after.expires_at >= before);
    assert_eq!(after.status, SessionStatus::Active);
}

#[tokio::test]
async fn logout_invalidates_the_session_and_clears_the_cookie() {
    let app = support::test_app();
    let (session_id, _) = register_user(&app, "alice@example.com").await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, format!("{COOKIE_NAME}={session_id}"))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("send request");

    assert_eq!(response.status(), StatusCode::OK);
    let raw = raw_set_cookie(response.headers(), COOKIE_NAME).expect("clear cookie");
    assert!(raw.contains("Max-Age=0"));
    let body = response_json(response).await;
    assert_eq!(body["message"], "Logged out successfully");

    let stored = app.session_store.get(&session_id).expect("session row kept");
    assert_eq!(stored.status, SessionStatus::LoggedOut);

    let (status, _) = get_me(
        &app,
        Request::builder()
            .uri("/api/auth/me")
            .header(header::COOKIE, format!("{COOKIE_NAME}={session_id}"))
            .body(Body::empty())
            .expect("build request"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_without_a_session_still_succeeds() {
    let app = support::test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("send request");

    assert_eq!(response.status(), StatusCode::OK);
    assert!(raw_set_cookie(response.headers(), COOKIE_NAME).is_none());
    let body = response_json(response).await;
    assert_eq!(body["message"], "Logged out successfully");
}

#[tokio::test]
async fn logout_with_an_unknown_session_still_succeeds() {
    let app = support::test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout")
                .header(header::COOKIE, format!("{COOKIE_NAME}={}", "f".repeat(64)))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Logged out successfully");
}

#[tokio::test]
async fn logout_all_ends_every_session_for_the_user() {
    let app = support::test_app();
    let (first_session, _) = register_user(&app, "alice@example.com").await;
    let (_, _, second) = login_user(&app, "alice@example.com", "correct horse battery").await;
    let second_session = second.expect("login cookie");

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/logout-all")
                .header(header::COOKIE, format!("{COOKIE_NAME}={first_session}"))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], "All sessions logged out successfully");

    for session_id in [&first_session, &second_session] {
        let (status, _) = get_me(
            &app,
            Request::builder()
                .uri("/api/auth/me")
                .header(header::COOKIE, format!("{COOKIE_NAME}={session_id}"))
                .body(Body::empty())
                .expect("build request"),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn validate_answers_ok_for_all_three_verdicts() {
    let app = support::test_app();
    let (session_id, _) = register_user(&app, "alice@example.com").await;

    // No session at all.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/validate")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "No session found");
    assert!(body.get("user").is_none());

    // A session id that does not exist.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/validate")
                .header(header::COOKIE, format!("{COOKIE_NAME}={}", "f".repeat(64)))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], false);
    assert_eq!(body["message"], "Invalid or expired session");

    // A live session.
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/validate")
                .header(header::COOKIE, format!("{COOKIE_NAME}={session_id}"))
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("send request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["message"], "Session is valid");
    assert_eq!(body["user"]["email"], "alice@example.com");
}

#[tokio::test]
async fn health_reports_the_service_running() {
    let app = support::test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/auth/health")
                .body(Body::empty())
                .expect("build request"),
        )
        .await
        .expect("send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["message"], "Auth service is running");
}
