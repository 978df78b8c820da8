//! Chat message list rendering.

use crate::conversation::{Message, MessageId, Role, Snapshot};

/// Shown when the conversation has no messages.
pub const WELCOME: &str =
    "👋 Welcome to AI Chat!\nStart a conversation by typing a message below.\n";

/// Cursor drawn after a message that is still streaming.
pub const TYPING_INDICATOR: char = '▌';

/// Label printed before a message's content.
pub fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    }
}

/// Render one message with its timestamp.
pub fn render_message(message: &Message) -> String {
    let cursor = if message.is_streaming {
        TYPING_INDICATOR.to_string()
    } else {
        String::new()
    };
    format!(
        "{}: {}{cursor}\n    {}\n",
        role_label(message.role),
        message.content,
        message.timestamp
    )
}

/// Render the whole conversation, or the welcome text when it is empty.
pub fn render_transcript(snapshot: &Snapshot) -> String {
    if snapshot.is_empty() {
        return WELCOME.to_string();
    }
    snapshot.messages().iter().map(render_message).collect()
}

/// Tracks how much of the latest assistant reply has been printed.
///
/// Fed successive snapshots, it returns only the text that has not been shown
/// yet, so a terminal can print a reply as it grows.
#[derive(Debug, Default)]
pub struct StreamPrinter {
    message_id: Option<MessageId>,
    shown: String,
}

impl StreamPrinter {
    /// Text to print for this snapshot, if anything new arrived.
    ///
    /// When the reply is replaced rather than extended (an error message
    /// overwriting partial text) the replacement is returned on a new line.
    pub fn delta(&mut self, snapshot: &Snapshot) -> Option<String> {
        let reply = snapshot
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)?;

        if self.message_id != Some(reply.id) {
            self.message_id = Some(reply.id);
            self.shown.clear();
        }

        if reply.content == self.shown {
            return None;
        }

        let out = match reply.content.strip_prefix(self.shown.as_str()) {
            Some(grown) => grown.to_string(),
            None => format!("\n{}", reply.content),
        };
        self.shown.clone_from(&reply.content);
        Some(out)
    }
}
