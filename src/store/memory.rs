// src/store/memory.rs
//! In-process stores, used when no DATABASE_URL is configured and in tests.
//! Contents are lost on restart.

use super::{FlashcardStore, StoreError, UserStore};
use crate::models::auth::{Account, AccountId, NewAccount};
use crate::models::flashcard::Flashcard;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct UserTable {
    next_id: AccountId,
    rows: Vec<Account>,
}

#[derive(Default)]
pub struct InMemoryUserStore {
    table: RwLock<UserTable>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().find(|a| a.id == id).cloned())
    }

    async fn insert(&self, account: NewAccount) -> Result<Account, StoreError> {
        // Check and insert under one write lock, like a unique index would.
        let mut table = self.table.write().await;
        if table.rows.iter().any(|a| a.email == account.email) {
            return Err(StoreError::DuplicateEmail);
        }

        table.next_id += 1;
        let row = Account {
            id: table.next_id,
            email: account.email,
            password_hash: account.password_hash,
            display_name: account.display_name,
            created_at: Utc::now(),
        };
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let table = self.table.read().await;
        Ok(table.rows.iter().rev().cloned().collect())
    }
}

#[derive(Default)]
pub struct InMemoryFlashcardStore {
    next_id: RwLock<i32>,
    cards: RwLock<HashMap<AccountId, Vec<Flashcard>>>,
}

impl InMemoryFlashcardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlashcardStore for InMemoryFlashcardStore {
    async fn list_for_user(&self, user_id: AccountId) -> Result<Vec<Flashcard>, StoreError> {
        let cards = self.cards.read().await;
        Ok(cards.get(&user_id).cloned().unwrap_or_default())
    }

    async fn insert(&self, user_id: AccountId, front: &str, back: &str) -> Result<Flashcard, StoreError> {
        let id = {
            let mut next_id = self.next_id.write().await;
            *next_id += 1;
            *next_id
        };

        let card = Flashcard {
            id,
            user_id,
            front: front.to_string(),
            back: back.to_string(),
            created_at: Utc::now(),
        };
        self.cards
            .write()
            .await
            .entry(user_id)
            .or_default()
            .push(card.clone());
        Ok(card)
    }

    async fn delete(&self, user_id: AccountId, card_id: i32) -> Result<bool, StoreError> {
        let mut cards = self.cards.write().await;
        let Some(owned) = cards.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = owned.len();
        owned.retain(|c| c.id != card_id);
        Ok(owned.len() != before)
    }
}
