use crate::errors::AuthError;
use crate::models::auth::AccountRef;
use crate::AppState;
use axum::{
    extract::{Extension, Request},
    http::{header, HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

pub const SESSION_COOKIE: &str = "session";

/// Resolves the caller's session and stores the identity in the request
/// extensions for handlers. Rejects the request with 401 otherwise.
pub async fn auth_middleware(
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = session_token(request.headers()).ok_or(AuthError::Unauthenticated)?;

    let identity = state.authenticator.current_identity(&token).await?;

    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Takes the session from `Authorization: Bearer <token>` or, failing that,
/// from the session cookie.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

pub fn session_cookie(token: &str, max_age_seconds: i64) -> HeaderValue {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        max_age_seconds.max(0)
    );
    // JWTs are base64url segments joined by dots, always a valid header value
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| expired_session_cookie())
}

pub fn expired_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

// Extension trait to easily extract the identity from request extensions
pub trait IdentityExtractor {
    fn identity(&self) -> Option<&AccountRef>;
}

impl IdentityExtractor for Request {
    fn identity(&self) -> Option<&AccountRef> {
        self.extensions().get::<AccountRef>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=zzz"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; session=tok.en.x; lang=en"));
        assert_eq!(session_token(&headers).as_deref(), Some("tok.en.x"));
    }

    #[test]
    fn test_missing_or_empty_session() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        headers.insert(header::COOKIE, HeaderValue::from_static("session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("a.b.c", 3600);
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("session=a.b.c;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(expired_session_cookie().to_str().unwrap().contains("Max-Age=0"));
    }
}
