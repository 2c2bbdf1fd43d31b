//! Single-writer holder of the live `Store`.
//!
//! All mutations go through one async mutex. A submission raises the shared
//! busy flag while the lock is held, so two submissions can never overlap.
//! Network results are applied to whatever the store looks like when they
//! arrive, addressed by thread id, never to the snapshot taken before the call.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::{Message, Store, StoreError, ThreadId};
use crate::repositories::{StoreRepository, ThreadStore};
use crate::services::{
    BusyFlag, CompletionClient, ConversationService, FireworksCompletionClient,
    FireworksImageClient, ImageClient, ImageRequestService,
};
use crate::settings::AssistantSettings;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A request is already in flight")]
    Busy,

    #[error("Input is empty")]
    EmptyInput,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct ChatSession {
    store: Mutex<Store>,
    thread_store: ThreadStore,
    conversation: ConversationService,
    images: ImageRequestService,
    busy: BusyFlag,
}

impl ChatSession {
    /// Build a session around an already restored store.
    pub fn new(
        store: Store,
        thread_store: ThreadStore,
        completion: Arc<dyn CompletionClient>,
        image: Arc<dyn ImageClient>,
    ) -> Self {
        let busy = BusyFlag::new();
        Self {
            store: Mutex::new(store),
            conversation: ConversationService::new(completion, thread_store.clone(), busy.clone()),
            images: ImageRequestService::new(image, thread_store.clone(), busy.clone()),
            thread_store,
            busy,
        }
    }

    /// Restore the persisted store and wire the given collaborators.
    pub async fn open(
        thread_store: ThreadStore,
        completion: Arc<dyn CompletionClient>,
        image: Arc<dyn ImageClient>,
    ) -> Self {
        let store = thread_store.restore().await;
        Self::new(store, thread_store, completion, image)
    }

    /// Restore from `repository` and talk to the Fireworks endpoints in
    /// `settings`.
    pub async fn from_settings(settings: &AssistantSettings, repository: Arc<dyn StoreRepository>) -> Self {
        Self::open(
            ThreadStore::new(repository),
            Arc::new(FireworksCompletionClient::from_settings(settings)),
            Arc::new(FireworksImageClient::from_settings(settings)),
        )
        .await
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub async fn snapshot(&self) -> Store {
        self.store.lock().await.clone()
    }

    /// Ask a question in the active thread and return the assistant message
    /// that was appended (the fallback text on collaborator failure).
    pub async fn submit_text(&self, query: &str) -> Result<Message, SessionError> {
        if query.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let (_busy, pending) = {
            let mut store = self.store.lock().await;
            let busy = self.busy.try_raise().ok_or(SessionError::Busy)?;

            let (next, pending) = self.conversation.begin(std::mem::take(&mut *store), query);
            *store = next;
            self.thread_store.persist(&store).await;
            (busy, pending)
        };

        let reply = self.conversation.exchange(&pending).await;

        let mut store = self.store.lock().await;
        let next = self
            .conversation
            .finish(std::mem::take(&mut *store), &pending, reply);
        *store = next;
        self.thread_store.persist(&store).await;

        last_message_of(&store, pending.thread_id)
    }

    /// Request an image in the active thread and return the message that was
    /// appended (an image, or the fallback text on failure).
    pub async fn submit_image(&self, prompt: &str) -> Result<Message, SessionError> {
        if prompt.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let (_busy, pending) = {
            let mut store = self.store.lock().await;
            let busy = self.busy.try_raise().ok_or(SessionError::Busy)?;

            let (next, pending) = self.images.begin(std::mem::take(&mut *store), prompt);
            *store = next;
            self.thread_store.persist(&store).await;
            (busy, pending)
        };

        let outcome = self.images.exchange(&pending).await;

        let mut store = self.store.lock().await;
        let next = self
            .images
            .finish(std::mem::take(&mut *store), &pending, outcome);
        *store = next;
        self.thread_store.persist(&store).await;

        last_message_of(&store, pending.thread_id)
    }

    /// Start an empty thread and make it active.
    pub async fn new_thread(&self) -> ThreadId {
        let mut store = self.store.lock().await;
        let id = store.create_thread(None, crate::models::timestamp::now());
        self.thread_store.persist(&store).await;
        info!(thread_id = id, "Started new thread");
        id
    }

    pub async fn switch_thread(&self, thread_id: ThreadId) -> Result<(), SessionError> {
        let mut store = self.store.lock().await;
        store.set_active(thread_id)?;
        self.thread_store.persist(&store).await;
        debug!(thread_id, "Switched active thread");
        Ok(())
    }

    pub async fn delete_thread(&self, thread_id: ThreadId) -> Result<(), SessionError> {
        let mut store = self.store.lock().await;
        if !store.delete_thread(thread_id) {
            return Err(StoreError::ThreadNotFound(thread_id).into());
        }
        self.thread_store.persist(&store).await;
        info!(thread_id, "Deleted thread");
        Ok(())
    }
}

fn last_message_of(store: &Store, thread_id: ThreadId) -> Result<Message, SessionError> {
    store
        .find_thread(thread_id)
        .and_then(|thread| thread.last_message())
        .cloned()
        .ok_or(SessionError::Store(StoreError::ThreadNotFound(thread_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::repositories::InMemoryStoreRepository;
    use crate::services::{ChatTurn, CollaboratorError, GeneratedImage, TEXT_FALLBACK};
    use async_trait::async_trait;
    use tokio::sync::Notify;

    /// Completion client that parks until released, so tests can act while a
    /// request is in flight.
    struct GatedClient {
        entered: Notify,
        release: Notify,
        reply: String,
    }

    impl GatedClient {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                entered: Notify::new(),
                release: Notify::new(),
                reply: reply.to_string(),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for GatedClient {
        async fn complete(&self, _history: &[ChatTurn]) -> Result<String, CollaboratorError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(self.reply.clone())
        }
    }

    struct InstantClient(Option<&'static str>);

    #[async_trait]
    impl CompletionClient for InstantClient {
        async fn complete(&self, _history: &[ChatTurn]) -> Result<String, CollaboratorError> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| CollaboratorError::MalformedResponse("down".into()))
        }
    }

    struct NoImages;

    #[async_trait]
    impl ImageClient for NoImages {
        async fn generate(&self, _prompt: &str) -> Result<GeneratedImage, CollaboratorError> {
            Err(CollaboratorError::MalformedResponse("no images".into()))
        }
    }

    fn session_with(completion: Arc<dyn CompletionClient>) -> (ChatSession, InMemoryStoreRepository) {
        let repo = InMemoryStoreRepository::new();
        let session = ChatSession::new(
            Store::new(),
            ThreadStore::new(Arc::new(repo.clone())),
            completion,
            Arc::new(NoImages),
        );
        (session, repo)
    }

    #[tokio::test]
    async fn test_blank_input_is_rejected() {
        let (session, repo) = session_with(Arc::new(InstantClient(Some("ok"))));

        assert!(matches!(session.submit_text("   ").await, Err(SessionError::EmptyInput)));
        assert!(matches!(session.submit_image("").await, Err(SessionError::EmptyInput)));
        assert!(session.snapshot().await.is_empty());
        assert!(repo.raw_snapshot().is_none());
    }

    #[tokio::test]
    async fn test_second_submission_while_busy_is_refused() {
        let client = GatedClient::new("done");
        let (session, _) = session_with(client.clone());

        let (first, ()) = tokio::join!(session.submit_text("How to recycle plastic bottles?"), async {
            client.entered.notified().await;
            assert!(session.is_busy());
            assert!(matches!(
                session.submit_text("Can I recycle pizza boxes?").await,
                Err(SessionError::Busy)
            ));
            assert!(matches!(
                session.submit_image("a bin").await,
                Err(SessionError::Busy)
            ));
            client.release.notify_one();
        });

        assert_eq!(first.unwrap().content(), "done");
        assert!(!session.is_busy());

        let store = session.snapshot().await;
        assert_eq!(store.threads()[0].message_count(), 2);
    }

    #[tokio::test]
    async fn test_reply_lands_in_its_thread_after_concurrent_changes() {
        let client = GatedClient::new("1. Clothes\n- Donate wearable items");
        let (session, repo) = session_with(client.clone());

        let (reply, new_thread) = tokio::join!(session.submit_text("Where to donate old clothes?"), async {
            client.entered.notified().await;
            let id = session.new_thread().await;
            client.release.notify_one();
            id
        });

        let reply = reply.unwrap();
        assert_eq!(reply.title(), Some("Clothes"));

        let store = session.snapshot().await;
        assert_eq!(store.threads().len(), 2);
        assert_eq!(store.active_thread_id(), Some(new_thread));

        let original = &store.threads()[1];
        let roles: Vec<_> = original.messages().iter().map(|m| m.role()).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(store.find_thread(new_thread).unwrap().message_count(), 0);

        let persisted: Store = serde_json::from_str(&repo.raw_snapshot().unwrap()).unwrap();
        assert_eq!(persisted, store);
    }

    #[tokio::test]
    async fn test_reply_for_deleted_thread_is_reported() {
        let client = GatedClient::new("late");
        let (session, _) = session_with(client.clone());

        let (reply, ()) = tokio::join!(session.submit_text("Short-lived"), async {
            client.entered.notified().await;
            let id = session.snapshot().await.threads()[0].id;
            session.delete_thread(id).await.unwrap();
            client.release.notify_one();
        });

        assert!(matches!(reply, Err(SessionError::Store(StoreError::ThreadNotFound(_)))));
        assert!(session.snapshot().await.is_empty());
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_failure_returns_fallback_message() {
        let (session, _) = session_with(Arc::new(InstantClient(None)));

        let reply = session.submit_text("How to recycle glass?").await.unwrap();
        assert_eq!(reply.content(), TEXT_FALLBACK);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_switch_and_delete_unknown_threads() {
        let (session, _) = session_with(Arc::new(InstantClient(Some("ok"))));
        let a = session.new_thread().await;
        let b = session.new_thread().await;

        session.switch_thread(a).await.unwrap();
        assert_eq!(session.snapshot().await.active_thread_id(), Some(a));

        assert!(session.switch_thread(b + 100).await.is_err());
        assert!(session.delete_thread(b + 100).await.is_err());

        session.delete_thread(a).await.unwrap();
        assert_eq!(session.snapshot().await.active_thread_id(), Some(b));
    }

    #[tokio::test]
    async fn test_open_restores_previous_session() {
        let repo = InMemoryStoreRepository::new();
        let thread_store = ThreadStore::new(Arc::new(repo.clone()));

        let first = ChatSession::open(
            thread_store.clone(),
            Arc::new(InstantClient(Some("Use the blue bin."))),
            Arc::new(NoImages),
        )
        .await;
        first.submit_text("Paper?").await.unwrap();
        let before = first.snapshot().await;

        let second = ChatSession::open(
            thread_store,
            Arc::new(InstantClient(Some("unused"))),
            Arc::new(NoImages),
        )
        .await;
        assert_eq!(second.snapshot().await, before);
    }
}
