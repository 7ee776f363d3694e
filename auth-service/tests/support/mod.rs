#![allow(dead_code)]
use std::sync::Arc;

use axum::http::{header, HeaderMap};
use axum::Router;
use serde_json::Value;

use storefront_auth::{
    config::Config,
    repositories::{MemorySessionStore, MemoryUserStore},
    router::build_router,
    services::{AuthService, MemorySessionCache, SessionService},
    state::AppState,
    utils::SameSite,
};

pub const COOKIE_NAME: &str = "STOREFRONT_SESSION";

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        redis_url: None,
        redis_pool_size: 2,
        redis_connect_timeout_seconds: 1,
        session_timeout_minutes: 30,
        max_sessions_per_user: 5,
        session_sweep_interval_seconds: 300,
        session_cookie_name: COOKIE_NAME.to_string(),
        cookie_secure: false,
        cookie_same_site: SameSite::Lax,
        cors_allow_origins: vec!["http://localhost:3000".to_string()],
        bind_addr: "127.0.0.1:0".to_string(),
    }
}

/// A full application wired over in-memory stores, plus handles to the
/// backing stores so tests can inspect or reach around the HTTP surface.
pub struct TestApp {
    pub router: Router,
    pub sessions: Arc<SessionService>,
    pub session_store: Arc<MemorySessionStore>,
    pub cache: Arc<MemorySessionCache>,
}

pub fn test_app() -> TestApp {
    test_app_with_config(test_config())
}

pub fn test_app_with_config(config: Config) -> TestApp {
    let session_store = Arc::new(MemorySessionStore::new());
    let user_store = Arc::new(MemoryUserStore::new());
    let cache = Arc::new(MemorySessionCache::new());

    let sessions = Arc::new(SessionService::new(
        session_store.clone(),
        Some(cache.clone()),
        config.session_timeout(),
        config.max_sessions_per_user,
    ));
    let auth = Arc::new(AuthService::new(user_store.clone(), sessions.clone()));

    let state = AppState::new(config, auth, sessions.clone(), user_store);
    TestApp {
        router: build_router(state),
        sessions,
        session_store,
        cache,
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&body).expect("parse json body")
}

pub fn extract_set_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .find_map(|value| {
            let value = value.to_str().ok()?;
            let token = value.strip_prefix(&prefix)?.split(';').next()?.trim();
            if token.is_empty() {
                None
            } else {
                Some(token.to_string())
            }
        })
}

/// Returns the raw Set-Cookie line for the named cookie, attributes included.
pub fn raw_set_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with(&prefix))
        .map(|value| value.to_string())
}
