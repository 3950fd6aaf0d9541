use crate::errors::{ApiError, ApiResult};
use crate::middleware::auth::auth_middleware;
use crate::models::auth::AccountRef;
use crate::models::flashcard::{CreateFlashcardRequest, Flashcard, FlashcardListResponse};
use crate::AppState;
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::{delete, get},
    Router,
};
use std::sync::Arc;

pub fn flashcard_routes() -> Router {
    Router::new()
        .route("/flashcards", get(list_flashcards).post(create_flashcard))
        .route("/flashcards/:id", delete(delete_flashcard))
        .layer(axum::middleware::from_fn(auth_middleware))
}

async fn list_flashcards(
    Extension(state): Extension<Arc<AppState>>,
    Extension(identity): Extension<AccountRef>,
) -> ApiResult<Json<FlashcardListResponse>> {
    let flashcards = state.flashcards.list_for_user(identity.id).await?;
    Ok(Json(FlashcardListResponse { success: true, flashcards }))
}

async fn create_flashcard(
    Extension(state): Extension<Arc<AppState>>,
    Extension(identity): Extension<AccountRef>,
    Json(payload): Json<CreateFlashcardRequest>,
) -> ApiResult<(StatusCode, Json<Flashcard>)> {
    let front = payload.front.trim();
    let back = payload.back.trim();
    if front.is_empty() || back.is_empty() {
        return Err(ApiError::BadRequest("Both sides of the flashcard are required".to_string()));
    }

    let card = state.flashcards.insert(identity.id, front, back).await?;
    tracing::info!("🗂️ Account {} created flashcard {}", identity.id, card.id);
    Ok((StatusCode::CREATED, Json(card)))
}

async fn delete_flashcard(
    Extension(state): Extension<Arc<AppState>>,
    Extension(identity): Extension<AccountRef>,
    Path(card_id): Path<i32>,
) -> ApiResult<StatusCode> {
    if state.flashcards.delete(identity.id, card_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Flashcard not found".to_string()))
    }
}
