use crate::errors::ApiResult;
use crate::middleware::admin::admin_middleware;
use crate::middleware::auth::auth_middleware;
use crate::models::auth::AccountResponse;
use crate::AppState;
use axum::{
    extract::Extension,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn admin_routes() -> Router {
    Router::new()
        .route("/admin", get(list_accounts))
        .layer(axum::middleware::from_fn(admin_middleware))
        .layer(axum::middleware::from_fn(auth_middleware))
}

/// Every registered account, newest first. Password hashes are never included.
async fn list_accounts(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let users: Vec<AccountResponse> = state
        .users
        .list()
        .await?
        .into_iter()
        .map(AccountResponse::from)
        .collect();

    Ok(Json(json!({
        "success": true,
        "total": users.len(),
        "users": users,
    })))
}
