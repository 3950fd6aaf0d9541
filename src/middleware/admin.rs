use crate::errors::AuthError;
use crate::middleware::auth::IdentityExtractor;
use crate::AppState;
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Lets only the configured administrator through. Must run after `auth_middleware`.
pub async fn admin_middleware(
    Extension(state): Extension<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let identity = request.identity().ok_or(AuthError::Unauthenticated)?;

    if !state.authenticator.is_administrator(identity) {
        tracing::warn!("Account {} denied administrator access", identity.id);
        return Err(AuthError::AccessDenied);
    }

    Ok(next.run(request).await)
}
