use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::image_ref::ImageRef;
use super::timestamp::rfc3339_millis;

/// Milliseconds since the Unix epoch at allocation time.
pub type MessageId = i64;

/// One numbered block of an assistant reply.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Image,
}

/// Role-specific payload of a message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum MessageBody {
    User {
        content: String,
    },
    Assistant {
        content: String,
        /// Every parsed section of the reply, in order. Empty for fallback
        /// replies.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        sections: Vec<Section>,
    },
    Image {
        #[serde(rename = "content")]
        prompt: String,
        image: ImageRef,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    #[serde(flatten)]
    pub body: MessageBody,
    #[serde(with = "rfc3339_millis")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(id: MessageId, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            body: MessageBody::User {
                content: content.into(),
            },
            created_at,
        }
    }

    pub fn assistant(
        id: MessageId,
        content: impl Into<String>,
        sections: Vec<Section>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            body: MessageBody::Assistant {
                content: content.into(),
                sections,
            },
            created_at,
        }
    }

    pub fn image(
        id: MessageId,
        prompt: impl Into<String>,
        image: ImageRef,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            body: MessageBody::Image {
                prompt: prompt.into(),
                image,
            },
            created_at,
        }
    }

    pub fn role(&self) -> Role {
        match self.body {
            MessageBody::User { .. } => Role::User,
            MessageBody::Assistant { .. } => Role::Assistant,
            MessageBody::Image { .. } => Role::Image,
        }
    }

    /// The utterance, or the original prompt for image messages.
    pub fn content(&self) -> &str {
        match &self.body {
            MessageBody::User { content } | MessageBody::Assistant { content, .. } => content,
            MessageBody::Image { prompt, .. } => prompt,
        }
    }

    /// Parsed sections of an assistant reply; empty for every other role.
    pub fn sections(&self) -> &[Section] {
        match &self.body {
            MessageBody::Assistant { sections, .. } => sections,
            _ => &[],
        }
    }

    /// Heading of the first parsed section.
    pub fn title(&self) -> Option<&str> {
        self.sections().first().map(|s| s.title.as_str())
    }

    /// Tips of the first parsed section.
    pub fn tips(&self) -> Option<&[String]> {
        self.sections().first().map(|s| s.tips.as_slice())
    }

    pub fn image_ref(&self) -> Option<&ImageRef> {
        match &self.body {
            MessageBody::Image { image, .. } => Some(image),
            _ => None,
        }
    }
}
