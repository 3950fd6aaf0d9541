// src/store/mod.rs
//! Account and flashcard persistence.
//!
//! Backends must be thread-safe (Send + Sync) since one instance is shared by
//! every request handler.

use crate::models::auth::{Account, AccountId, NewAccount};
use crate::models::flashcard::Flashcard;
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::{InMemoryFlashcardStore, InMemoryUserStore};
pub use postgres::{PgFlashcardStore, PgUserStore};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("An account with this email already exists")]
    DuplicateEmail,
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    /// Fails with `DuplicateEmail` when the email is already taken.
    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError>;

    /// All accounts, newest first.
    async fn list(&self) -> Result<Vec<Account>, StoreError>;
}

#[async_trait]
pub trait FlashcardStore: Send + Sync {
    async fn list_for_user(&self, user_id: AccountId) -> Result<Vec<Flashcard>, StoreError>;

    async fn insert(&self, user_id: AccountId, front: &str, back: &str) -> Result<Flashcard, StoreError>;

    /// Returns false when the card does not exist or belongs to another account.
    async fn delete(&self, user_id: AccountId, card_id: i32) -> Result<bool, StoreError>;
}
