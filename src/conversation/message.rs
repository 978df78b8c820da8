//! Message model.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;
use serde::{Deserialize, Serialize};

/// Next identifier handed out by [`MessageId::next`].
static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Unique message identifier.
///
/// Allocated from a process-wide counter, so two messages created in the same
/// millisecond still get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    /// Allocate a fresh identifier.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Typed by the person at the keyboard.
    User,
    /// Streamed back from the backend.
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier.
    pub id: MessageId,
    /// Author of the message.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Local time the message was created, formatted for display.
    pub timestamp: String,
    /// Whether the assistant is still streaming into this message.
    #[serde(default)]
    pub is_streaming: bool,
}

impl Message {
    /// Create a finished user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::next(),
            role: Role::User,
            content: content.into(),
            timestamp: display_time(),
            is_streaming: false,
        }
    }

    /// Create the empty assistant message that a stream fills in.
    #[must_use]
    pub fn assistant_placeholder() -> Self {
        Self {
            id: MessageId::next(),
            role: Role::Assistant,
            content: String::new(),
            timestamp: display_time(),
            is_streaming: true,
        }
    }

    /// Return a copy of this message with the patch applied.
    #[must_use]
    pub fn patched(&self, patch: &MessagePatch) -> Self {
        let mut next = self.clone();
        if let Some(content) = &patch.content {
            next.content.clone_from(content);
        }
        if let Some(is_streaming) = patch.is_streaming {
            next.is_streaming = is_streaming;
        }
        next
    }
}

/// Partial update for a message, applied by id.
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessagePatch {
    /// Replacement content.
    pub content: Option<String>,
    /// Replacement streaming flag.
    pub is_streaming: Option<bool>,
}

impl MessagePatch {
    /// Replace the content, leaving the streaming flag alone.
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            is_streaming: None,
        }
    }

    /// Mark the message as no longer streaming.
    #[must_use]
    pub fn finished() -> Self {
        Self {
            content: None,
            is_streaming: Some(false),
        }
    }

    /// Replace the content and stop streaming in one step.
    #[must_use]
    pub fn failed(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            is_streaming: Some(false),
        }
    }
}

/// Current local time as `h:mm:ss AM`.
fn display_time() -> String {
    Local::now().format("%-I:%M:%S %p").to_string()
}
