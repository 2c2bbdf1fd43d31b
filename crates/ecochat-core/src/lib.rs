//! Thread engine for the ecochat recycling assistant.
//!
//! `ChatSession` is the entry point: it owns the live `Store`, routes text
//! questions through `ConversationService` and image prompts through
//! `ImageRequestService`, and persists every change through `ThreadStore`.

pub mod models;
pub mod repositories;
pub mod services;
pub mod session;
pub mod settings;

pub use models::{ChatThread, ImageRef, Message, Role, Section, Store, StoreError, ThreadId};
pub use repositories::{InMemoryStoreRepository, StoreJsonRepository, StoreRepository, ThreadStore};
pub use session::{ChatSession, SessionError};
pub use settings::AssistantSettings;
