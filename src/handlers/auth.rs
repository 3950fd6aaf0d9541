use crate::errors::{ApiResult, AuthError};
use crate::middleware::auth::{expired_session_cookie, session_cookie, session_token};
use crate::models::auth::{AccountResponse, AuthResponse, LoginRequest, RegisterRequest};
use crate::services::Session;
use crate::AppState;
use axum::{
    extract::Extension,
    http::{header, HeaderMap},
    response::{IntoResponse, Json, Redirect, Response},
    routing::{get, post, Router},
};
use std::sync::Arc;

pub fn auth_routes() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
}

async fn register(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Response> {
    let (account, session) = state
        .authenticator
        .register(&payload.email, &payload.password, payload.name.as_deref())
        .await?;

    Ok(session_response(
        session,
        AccountResponse::from(account),
        "Account created successfully",
    ))
}

async fn login(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Response> {
    let session = state
        .authenticator
        .authenticate(&payload.email, &payload.password)
        .await?;

    // The session carries everything except the creation time
    let account = state
        .users
        .find_by_id(session.identity.id)
        .await?
        .map(AccountResponse::from)
        .ok_or(AuthError::InvalidCredentials)?;

    Ok(session_response(session, account, "Login successful"))
}

async fn logout(Extension(state): Extension<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.authenticator.logout(&token).await;
    }

    (
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}

fn session_response(session: Session, user: AccountResponse, message: &str) -> Response {
    let cookie = session_cookie(&session.token, session.remaining_seconds());

    (
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            success: true,
            message: message.to_string(),
            user,
            token: session.token,
        }),
    )
        .into_response()
}
