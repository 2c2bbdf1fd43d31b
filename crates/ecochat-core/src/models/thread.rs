use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::{Message, MessageBody};
use super::timestamp::rfc3339_millis;

pub type ThreadId = i64;

pub const DEFAULT_THREAD_TITLE: &str = "New Chat";
const TITLE_MAX_CHARS: usize = 30;

/// One independent conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatThread {
    pub id: ThreadId,
    pub title: String,
    #[serde(with = "rfc3339_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    messages: Vec<Message>,
}

impl ChatThread {
    pub fn new(id: ThreadId, seed: Option<&str>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: seed
                .and_then(title_from_seed)
                .unwrap_or_else(|| DEFAULT_THREAD_TITLE.to_string()),
            created_at,
            messages: Vec::new(),
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Append, retitling an untitled thread from its first user message.
    ///
    /// A message whose id does not exceed the previous one is re-stamped so
    /// the ordering invariant cannot be broken by a caller.
    pub(crate) fn push(&mut self, mut message: Message) {
        if let Some(last) = self.messages.last()
            && message.id <= last.id
        {
            message.id = last.id + 1;
        }

        if self.messages.is_empty()
            && self.title == DEFAULT_THREAD_TITLE
            && let MessageBody::User { content } = &message.body
            && let Some(title) = title_from_seed(content)
        {
            self.title = title;
        }

        self.messages.push(message);
    }
}

/// First 30 characters of the seed, or `None` when it is blank.
fn title_from_seed(seed: &str) -> Option<String> {
    let trimmed = seed.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(TITLE_MAX_CHARS).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn test_title_truncates_to_thirty_chars() {
        let thread = ChatThread::new(
            1,
            Some("What should I do with old electronics and cables?"),
            at(1),
        );
        assert_eq!(thread.title, "What should I do with old elec");
        assert_eq!(thread.title.chars().count(), 30);
    }

    #[test]
    fn test_title_counts_characters_not_bytes() {
        let thread = ChatThread::new(1, Some("♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻♻"), at(1));
        assert_eq!(thread.title.chars().count(), 30);
    }

    #[test]
    fn test_blank_seed_uses_placeholder() {
        assert_eq!(ChatThread::new(1, None, at(1)).title, DEFAULT_THREAD_TITLE);
        assert_eq!(ChatThread::new(1, Some("   "), at(1)).title, DEFAULT_THREAD_TITLE);
    }

    #[test]
    fn test_untitled_thread_takes_first_user_message_as_title() {
        let mut thread = ChatThread::new(1, None, at(1));
        thread.push(Message::user(2, "Can I recycle pizza boxes?", at(2)));
        assert_eq!(thread.title, "Can I recycle pizza boxes?");

        thread.push(Message::user(3, "And greasy ones?", at(3)));
        assert_eq!(thread.title, "Can I recycle pizza boxes?");
    }

    #[test]
    fn test_push_restamps_out_of_order_ids() {
        let mut thread = ChatThread::new(1, None, at(1));
        thread.push(Message::user(50, "a", at(50)));
        thread.push(Message::user(20, "b", at(20)));

        let ids: Vec<_> = thread.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![50, 51]);
    }
}
