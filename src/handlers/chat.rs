// src/handlers/chat.rs
use crate::middleware::auth::auth_middleware;
use crate::models::auth::AccountRef;
use crate::models::chat::{ChatRequest, ChatResponse, Turn};
use crate::AppState;
use axum::{
    extract::Extension,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn chat_routes() -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/history", get(get_history).delete(clear_history))
        .layer(axum::middleware::from_fn(auth_middleware))
}

/// Always answers 200. A failed inference call is rendered as the degraded
/// reply text, which is also what the history remembers.
async fn chat(
    Extension(state): Extension<Arc<AppState>>,
    Extension(identity): Extension<AccountRef>,
    Json(payload): Json<ChatRequest>,
) -> Json<ChatResponse> {
    tracing::info!("💬 Chat message from account {} ({} chars)", identity.id, payload.message.len());

    let reply = match state
        .conversations
        .submit_message(identity.id, &identity.display_name, &payload.message)
        .await
    {
        Ok(reply) => reply,
        Err(e) => e.degraded_reply(),
    };

    Json(ChatResponse { reply })
}

async fn get_history(
    Extension(state): Extension<Arc<AppState>>,
    Extension(identity): Extension<AccountRef>,
) -> Json<Vec<Turn>> {
    Json(state.conversations.get_history(identity.id).await)
}

async fn clear_history(
    Extension(state): Extension<Arc<AppState>>,
    Extension(identity): Extension<AccountRef>,
) -> StatusCode {
    state.conversations.clear_history(identity.id).await;
    StatusCode::NO_CONTENT
}
