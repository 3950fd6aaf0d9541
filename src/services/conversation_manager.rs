// src/services/conversation_manager.rs
use crate::inference_client::{GatewayError, InferenceGateway};
use crate::models::auth::AccountId;
use crate::models::chat::{PromptMessage, Turn};
use crate::services::history::BoundedHistory;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type SharedHistory = Arc<Mutex<BoundedHistory>>;

/// Keeps one bounded, in-memory conversation per account and runs chat
/// exchanges against the inference gateway.
///
/// Histories live for the lifetime of the process only. Every mutation of an
/// account's history happens while holding that account's mutex, and the
/// mutex is held for the whole exchange (prompt, gateway call, append), so
/// concurrent submissions for one account are applied one after the other.
pub struct ConversationManager {
    gateway: Arc<dyn InferenceGateway>,
    model: String,
    assistant_name: String,
    capacity: usize,
    histories: RwLock<HashMap<AccountId, SharedHistory>>,
}

impl ConversationManager {
    pub fn new(
        gateway: Arc<dyn InferenceGateway>,
        model: impl Into<String>,
        assistant_name: impl Into<String>,
        capacity: usize,
    ) -> Self {
        Self {
            gateway,
            model: model.into(),
            assistant_name: assistant_name.into(),
            capacity,
            histories: RwLock::new(HashMap::new()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of accounts with a history in this process.
    pub async fn active_conversations(&self) -> usize {
        self.histories.read().await.len()
    }

    /// Fetch or lazily create the history for an account.
    async fn history_for(&self, account_id: AccountId) -> SharedHistory {
        {
            let histories = self.histories.read().await;
            if let Some(history) = histories.get(&account_id) {
                return history.clone();
            }
        }

        let mut histories = self.histories.write().await;
        histories
            .entry(account_id)
            .or_insert_with(|| {
                tracing::debug!("Creating conversation history for account {}", account_id);
                Arc::new(Mutex::new(BoundedHistory::new(self.capacity)))
            })
            .clone()
    }

    /// Oldest turn first; empty for an account that never chatted.
    pub async fn get_history(&self, account_id: AccountId) -> Vec<Turn> {
        let history = self.history_for(account_id).await;
        let turns = history.lock().await.to_vec();
        turns
    }

    pub async fn clear_history(&self, account_id: AccountId) {
        let history = {
            let histories = self.histories.read().await;
            histories.get(&account_id).cloned()
        };

        if let Some(history) = history {
            history.lock().await.clear();
            tracing::info!("Cleared conversation history for account {}", account_id);
        }
    }

    pub fn system_prompt(&self, display_name: &str) -> String {
        format!(
            "You are {}, a helpful and friendly AI chat assistant. You are talking with {}. \
             Address them by name when it feels natural and keep answers clear and concise.",
            self.assistant_name, display_name
        )
    }

    /// System instruction, then the stored turns oldest first, then the new message.
    pub fn build_prompt(&self, history: &BoundedHistory, display_name: &str, text: &str) -> Vec<PromptMessage> {
        let mut prompt = Vec::with_capacity(history.len() + 2);
        prompt.push(PromptMessage::system(self.system_prompt(display_name)));
        prompt.extend(history.iter().map(PromptMessage::from));
        prompt.push(PromptMessage::user(text));
        prompt
    }

    /// Runs one exchange and records it.
    ///
    /// The user turn and the assistant turn are always appended. On gateway
    /// failure the assistant turn is `GatewayError::degraded_reply()`, and the
    /// error is returned so the caller can render that same text.
    pub async fn submit_message(
        &self,
        account_id: AccountId,
        display_name: &str,
        text: &str,
    ) -> Result<String, GatewayError> {
        let history = self.history_for(account_id).await;
        let mut history = history.lock().await;

        let prompt = self.build_prompt(&history, display_name, text);
        tracing::debug!(
            "Submitting message for account {} with {} prompt messages",
            account_id,
            prompt.len()
        );

        let result = self.gateway.complete(&self.model, &prompt).await;
        let assistant_text = match &result {
            Ok(reply) => reply.clone(),
            Err(e) => {
                tracing::warn!("Inference failed for account {}: {}", account_id, e);
                e.degraded_reply()
            }
        };

        let evicted = history.push_exchange(Turn::user(text), Turn::assistant(assistant_text));
        if evicted > 0 {
            tracing::debug!("Evicted {} old turn(s) for account {}", evicted, account_id);
        }

        result
    }
}
