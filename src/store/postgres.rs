// src/store/postgres.rs
use super::{FlashcardStore, StoreError, UserStore};
use crate::models::auth::{Account, AccountId, NewAccount};
use crate::models::flashcard::Flashcard;
use async_trait::async_trait;
use sqlx::PgPool;

// PostgreSQL SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Clone)]
pub struct PgUserStore {
    db_pool: PgPool,
}

impl PgUserStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code == UNIQUE_VIOLATION)
        .unwrap_or(false)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, display_name, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(account)
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, display_name, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(account)
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError> {
        // The unique index on email settles registration races; no pre-check.
        sqlx::query_as::<_, Account>(
            "INSERT INTO users (email, password_hash, display_name, created_at)
             VALUES ($1, $2, $3, NOW())
             RETURNING id, email, password_hash, display_name, created_at",
        )
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.display_name)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = sqlx::query_as::<_, Account>(
            "SELECT id, email, password_hash, display_name, created_at FROM users ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(accounts)
    }
}

#[derive(Clone)]
pub struct PgFlashcardStore {
    db_pool: PgPool,
}

impl PgFlashcardStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl FlashcardStore for PgFlashcardStore {
    async fn list_for_user(&self, user_id: AccountId) -> Result<Vec<Flashcard>, StoreError> {
        let cards = sqlx::query_as::<_, Flashcard>(
            "SELECT id, user_id, front, back, created_at FROM flashcards
             WHERE user_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(cards)
    }

    async fn insert(&self, user_id: AccountId, front: &str, back: &str) -> Result<Flashcard, StoreError> {
        let card = sqlx::query_as::<_, Flashcard>(
            "INSERT INTO flashcards (user_id, front, back, created_at)
             VALUES ($1, $2, $3, NOW())
             RETURNING id, user_id, front, back, created_at",
        )
        .bind(user_id)
        .bind(front)
        .bind(back)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(card)
    }

    async fn delete(&self, user_id: AccountId, card_id: i32) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM flashcards WHERE id = $1 AND user_id = $2")
            .bind(card_id)
            .bind(user_id)
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
