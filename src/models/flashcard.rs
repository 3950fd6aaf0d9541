use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::auth::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Flashcard {
    pub id: i32,
    pub user_id: AccountId,
    pub front: String,
    pub back: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFlashcardRequest {
    #[serde(default)]
    pub front: String,
    #[serde(default)]
    pub back: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FlashcardListResponse {
    pub success: bool,
    pub flashcards: Vec<Flashcard>,
}
