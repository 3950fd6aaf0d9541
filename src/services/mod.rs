// src/services/mod.rs
pub mod authenticator;
pub mod conversation_manager;
pub mod history;

pub use authenticator::{AdministratorPredicate, Session, SessionAuthenticator};
pub use conversation_manager::ConversationManager;
pub use history::BoundedHistory;
