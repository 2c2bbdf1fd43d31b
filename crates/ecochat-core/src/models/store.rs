use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::message::{Message, MessageId};
use super::thread::{ChatThread, ThreadId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Thread {0} does not exist")]
    ThreadNotFound(ThreadId),
}

/// Every thread of the local user, newest first, plus the active pointer.
///
/// Mutations take `&mut self` on an owned value: callers hand a `Store` to a
/// service and get the next `Store` back, so each operation is one state
/// transition with no other observer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(default)]
    threads: Vec<ChatThread>,
    #[serde(default)]
    active_thread_id: Option<ThreadId>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threads(&self) -> &[ChatThread] {
        &self.threads
    }

    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    pub fn active_thread_id(&self) -> Option<ThreadId> {
        self.active_thread_id
    }

    pub fn active_thread(&self) -> Option<&ChatThread> {
        self.active_thread_id.and_then(|id| self.find_thread(id))
    }

    pub fn find_thread(&self, id: ThreadId) -> Option<&ChatThread> {
        self.threads.iter().find(|t| t.id == id)
    }

    /// Locate the thread holding a message id.
    pub fn find_message(&self, message_id: MessageId) -> Option<(&ChatThread, &Message)> {
        self.threads.iter().find_map(|thread| {
            thread
                .messages()
                .iter()
                .find(|m| m.id == message_id)
                .map(|m| (thread, m))
        })
    }

    /// Prepend a new thread and make it active.
    ///
    /// The id is the creation time in milliseconds, bumped past the newest
    /// existing id when two threads are created in the same millisecond.
    pub fn create_thread(&mut self, seed: Option<&str>, now: DateTime<Utc>) -> ThreadId {
        let candidate = now.timestamp_millis();
        let id = match self.threads.iter().map(|t| t.id).max() {
            Some(max) if max >= candidate => max + 1,
            _ => candidate,
        };

        self.threads.insert(0, ChatThread::new(id, seed, now));
        self.active_thread_id = Some(id);
        id
    }

    /// Append to a thread, preserving the order of everything already there.
    ///
    /// A message whose id does not exceed the newest id in the store is
    /// re-stamped past it, so ids stay unique and increasing store-wide.
    pub fn append_message(&mut self, thread_id: ThreadId, mut message: Message) -> Result<(), StoreError> {
        if self.find_thread(thread_id).is_none() {
            return Err(StoreError::ThreadNotFound(thread_id));
        }
        if let Some(newest) = self.newest_message_id()
            && message.id <= newest
        {
            message.id = newest + 1;
        }

        if let Some(thread) = self.threads.iter_mut().find(|t| t.id == thread_id) {
            thread.push(message);
        }
        Ok(())
    }

    /// Append a user message to the active thread, first creating a thread
    /// seeded with `content` when none is active.
    pub fn push_user_message(&mut self, content: &str, now: DateTime<Utc>) -> ThreadId {
        let thread_id = match self.active_thread_id.filter(|id| self.find_thread(*id).is_some()) {
            Some(id) => id,
            None => self.create_thread(Some(content), now),
        };

        let id = self.next_message_id(now);
        if let Some(thread) = self.threads.iter_mut().find(|t| t.id == thread_id) {
            thread.push(Message::user(id, content, now));
        }
        thread_id
    }

    pub fn set_active(&mut self, thread_id: ThreadId) -> Result<(), StoreError> {
        if self.find_thread(thread_id).is_none() {
            return Err(StoreError::ThreadNotFound(thread_id));
        }
        self.active_thread_id = Some(thread_id);
        Ok(())
    }

    /// Remove a thread. If it was active, the newest remaining thread becomes
    /// active.
    pub fn delete_thread(&mut self, thread_id: ThreadId) -> bool {
        let before = self.threads.len();
        self.threads.retain(|t| t.id != thread_id);
        let removed = self.threads.len() != before;

        if self.active_thread_id == Some(thread_id) {
            self.active_thread_id = self.threads.first().map(|t| t.id);
        }

        removed
    }

    /// Id for the next message appended anywhere in the store: the clock
    /// value, bumped past the newest existing message id.
    pub fn next_message_id(&self, now: DateTime<Utc>) -> MessageId {
        let candidate = now.timestamp_millis();
        match self.newest_message_id() {
            Some(newest) if newest >= candidate => newest + 1,
            _ => candidate,
        }
    }

    fn newest_message_id(&self) -> Option<MessageId> {
        self.threads
            .iter()
            .flat_map(|t| t.messages())
            .map(|m| m.id)
            .max()
    }

    /// Drop an active pointer that no longer refers to a thread. Returns
    /// whether anything changed.
    pub(crate) fn repair_active_pointer(&mut self) -> bool {
        match self.active_thread_id {
            Some(id) if self.find_thread(id).is_none() => {
                self.active_thread_id = None;
                true
            }
            _ => false,
        }
    }
}
