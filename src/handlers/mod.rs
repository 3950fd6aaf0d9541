// src/handlers/mod.rs
pub mod admin;
pub mod auth;
pub mod chat;
pub mod flashcards;
pub mod ui;

use crate::db;
use crate::middleware;
use crate::AppState;
use axum::{
    extract::Extension,
    response::Json,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Builds the full application with all routes and shared state.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(ui::ui_routes())
        .merge(auth::auth_routes())
        .merge(chat::chat_routes())
        .merge(flashcards::flashcard_routes())
        .merge(admin::admin_routes())
        .route("/api/status", get(api_status))
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let db_status = match &state.db_pool {
        Some(pool) => {
            if db::is_healthy(pool).await {
                "healthy"
            } else {
                "unhealthy"
            }
        }
        None => "in_memory",
    };

    let inference_status = if state.config.inference.api_token.is_some() {
        "configured"
    } else {
        "not_configured"
    };

    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status,
            "inference": inference_status,
        },
        "conversation": {
            "model": state.conversations.model(),
            "history_capacity": state.conversations.capacity(),
            "active_conversations": state.conversations.active_conversations().await,
        },
        "administrator_configured": state.authenticator.administrator().is_configured(),
    }))
}
