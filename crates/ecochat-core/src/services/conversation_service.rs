use std::sync::Arc;

use tracing::{debug, info, warn};

use super::busy::BusyFlag;
use super::completion_client::{ChatTurn, CompletionClient};
use super::response_parser;
use crate::models::{Message, Section, Store, ThreadId, timestamp};
use crate::repositories::ThreadStore;

pub const TEXT_FALLBACK: &str = "Sorry, there was an error processing your request.";

/// A text exchange whose user message is already in the store.
#[derive(Clone, Debug)]
pub struct PendingText {
    pub thread_id: ThreadId,
    pub history: Vec<ChatTurn>,
}

/// Reply content ready to be appended as an assistant message.
#[derive(Clone, Debug, PartialEq)]
pub struct AssistantReply {
    pub content: String,
    pub sections: Vec<Section>,
}

impl AssistantReply {
    pub fn fallback() -> Self {
        Self {
            content: TEXT_FALLBACK.to_string(),
            sections: Vec::new(),
        }
    }
}

/// Orchestrates one question/answer round trip against the completion
/// collaborator.
#[derive(Clone)]
pub struct ConversationService {
    client: Arc<dyn CompletionClient>,
    thread_store: ThreadStore,
    busy: BusyFlag,
}

impl ConversationService {
    pub fn new(client: Arc<dyn CompletionClient>, thread_store: ThreadStore, busy: BusyFlag) -> Self {
        Self {
            client,
            thread_store,
            busy,
        }
    }

    /// Ask `query` in the active thread (creating one if needed) and return
    /// the store with both the question and the reply appended.
    ///
    /// Never fails: a collaborator error appends `TEXT_FALLBACK` instead.
    pub async fn send_text(&self, store: Store, query: &str) -> Store {
        let _busy = self.busy.raise();

        let (store, pending) = self.begin(store, query);
        self.thread_store.persist(&store).await;

        let reply = self.exchange(&pending).await;

        let store = self.finish(store, &pending, reply);
        self.thread_store.persist(&store).await;
        store
    }

    /// Append the user message and capture the history to send.
    pub fn begin(&self, mut store: Store, query: &str) -> (Store, PendingText) {
        let thread_id = store.push_user_message(query, timestamp::now());

        let history = store
            .find_thread(thread_id)
            .map(|thread| thread.messages().iter().map(ChatTurn::from).collect())
            .unwrap_or_default();

        debug!(thread_id, "Prepared text exchange");
        (store, PendingText { thread_id, history })
    }

    /// Call the collaborator and structure its reply.
    pub async fn exchange(&self, pending: &PendingText) -> AssistantReply {
        match self.client.complete(&pending.history).await {
            Ok(content) => {
                let sections = response_parser::parse(&content);
                info!(
                    thread_id = pending.thread_id,
                    sections = sections.len(),
                    "Received completion"
                );
                AssistantReply { content, sections }
            }
            Err(e) => {
                warn!(thread_id = pending.thread_id, error = %e, "Completion request failed");
                AssistantReply::fallback()
            }
        }
    }

    /// Append the reply to the exchange's thread in `store`.
    pub fn finish(&self, mut store: Store, pending: &PendingText, reply: AssistantReply) -> Store {
        let now = timestamp::now();
        let id = store.next_message_id(now);
        let message = Message::assistant(id, reply.content, reply.sections, now);

        if let Err(e) = store.append_message(pending.thread_id, message) {
            warn!(error = %e, "Dropping reply for a thread that no longer exists");
        }
        store
    }
}
