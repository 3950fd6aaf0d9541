// lib.rs - Library root shared by the server and the admin tools
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod inference_client;
pub mod middleware;
pub mod models;
pub mod services;
pub mod store;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

pub use config::AppConfig;
pub use handlers::app;

// AppState holds the account and flashcard stores, the session authenticator and
// the per-account conversations. The pool is only present when DATABASE_URL is set.
pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<dyn store::UserStore>,
    pub flashcards: Arc<dyn store::FlashcardStore>,
    pub authenticator: Arc<services::SessionAuthenticator>,
    pub conversations: Arc<services::ConversationManager>,
    pub db_pool: Option<sqlx::PgPool>,
}
