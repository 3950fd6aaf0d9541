// src/test_support.rs
//! Fakes shared by the unit tests.

use crate::config::AppConfig;
use crate::inference_client::{GatewayError, InferenceGateway};
use crate::models::chat::{PromptMessage, Role};
use crate::services::{ConversationManager, SessionAuthenticator};
use crate::store::{InMemoryFlashcardStore, InMemoryUserStore};
use crate::AppState;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Gateway that answers "reply to: <last user message>" or always fails,
/// recording every prompt it receives.
pub struct ScriptedGateway {
    failure: Option<GatewayError>,
    delay: Option<Duration>,
    calls: Mutex<Vec<(String, Vec<PromptMessage>)>>,
}

impl ScriptedGateway {
    pub fn echo() -> Self {
        Self { failure: None, delay: None, calls: Mutex::new(Vec::new()) }
    }

    pub fn failing(error: GatewayError) -> Self {
        Self { failure: Some(error), delay: None, calls: Mutex::new(Vec::new()) }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn prompts(&self) -> Vec<Vec<PromptMessage>> {
        self.calls.lock().await.iter().map(|(_, p)| p.clone()).collect()
    }

    pub async fn models(&self) -> Vec<String> {
        self.calls.lock().await.iter().map(|(m, _)| m.clone()).collect()
    }
}

#[async_trait]
impl InferenceGateway for ScriptedGateway {
    async fn complete(&self, model: &str, messages: &[PromptMessage]) -> Result<String, GatewayError> {
        self.calls.lock().await.push((model.to_string(), messages.to_vec()));

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(format!("reply to: {}", last_user))
    }
}

pub const ADMIN_EMAIL: &str = "admin@example.com";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::from_lookup(|key| match key {
        "SESSION_SECRET" => Some("test-secret".to_string()),
        "ADMIN_EMAIL" => Some(ADMIN_EMAIL.to_string()),
        // Lowest cost bcrypt accepts, keeps tests fast
        "BCRYPT_COST" => Some("4".to_string()),
        _ => None,
    })
    .expect("test config");
    config.inference.model = "test-model".to_string();
    config
}

pub fn test_authenticator() -> SessionAuthenticator {
    SessionAuthenticator::new(Arc::new(InMemoryUserStore::new()), &test_config())
}

pub fn test_state(gateway: Arc<dyn InferenceGateway>) -> Arc<AppState> {
    let config = test_config();
    let users = Arc::new(InMemoryUserStore::new());
    let authenticator = Arc::new(SessionAuthenticator::new(users.clone(), &config));
    let conversations = Arc::new(ConversationManager::new(
        gateway,
        config.inference.model.clone(),
        config.assistant_name.clone(),
        config.history_capacity,
    ));

    Arc::new(AppState {
        config,
        users,
        flashcards: Arc::new(InMemoryFlashcardStore::new()),
        authenticator,
        conversations,
        db_pool: None,
    })
}
