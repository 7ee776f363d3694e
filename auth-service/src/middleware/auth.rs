use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::models::Session;
use crate::state::AppState;
use crate::utils::extract_cookie_value;

/// Fallback header for clients that cannot send cookies.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// The validated session behind the current request, inserted by
/// [`require_session`].
#[derive(Clone, Debug)]
pub struct CurrentSession(pub Session);

/// Validates the caller's session and loads the owning user. Protected
/// routes see both as request extensions; everything else gets a 401
/// before the handler runs.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_id = extract_session_id(request.headers(), &state.config.session_cookie_name)
        .unwrap_or_default();

    let session = state.sessions.validate(&session_id).await?;
    let user = state
        .users
        .find_by_id(session.user_id)
        .await?
        .ok_or_else(|| {
            AppError::InternalServerError(anyhow::anyhow!(
                "no user row for validated session {}",
                session.session_id
            ))
        })?;

    request.extensions_mut().insert(CurrentSession(session));
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Pulls the session id out of the request: cookie first, then the
/// `x-session-id` header.
pub fn extract_session_id(headers: &axum::http::HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| extract_cookie_value(raw, cookie_name));
    if from_cookie.is_some() {
        return from_cookie;
    }
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};

    #[test]
    fn cookie_takes_precedence_over_the_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("STOREFRONT_SESSION=from-cookie"),
        );
        headers.insert(SESSION_ID_HEADER, HeaderValue::from_static("from-header"));

        assert_eq!(
            extract_session_id(&headers, "STOREFRONT_SESSION").as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn header_is_used_when_no_cookie_matches() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.insert(SESSION_ID_HEADER, HeaderValue::from_static("from-header"));

        assert_eq!(
            extract_session_id(&headers, "STOREFRONT_SESSION").as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn no_cookie_and_no_header_yields_none() {
        let headers = HeaderMap::new();
        assert!(extract_session_id(&headers, "STOREFRONT_SESSION").is_none());
    }
}
