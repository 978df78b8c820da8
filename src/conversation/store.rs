//! Conversation state store.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::message::{Message, MessageId, MessagePatch};

/// Immutable view of the conversation.
///
/// Every mutation of a [`Conversation`] publishes a new snapshot; snapshots
/// already handed out are never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    messages: Arc<[Message]>,
    thread_id: Arc<str>,
    is_streaming: bool,
}

impl Snapshot {
    fn empty(thread_id: &str) -> Self {
        Self {
            messages: Arc::from(Vec::new()),
            thread_id: Arc::from(thread_id),
            is_streaming: false,
        }
    }

    /// Messages in display order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Thread identifier shared with the backend.
    #[must_use]
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Whether an assistant turn is in flight.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.is_streaming
    }

    /// Look up a message by id.
    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// The message currently being streamed into, if any.
    #[must_use]
    pub fn streaming_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_streaming)
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if there are no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn with_messages(&self, messages: Vec<Message>) -> Self {
        Self {
            messages: Arc::from(messages),
            thread_id: Arc::clone(&self.thread_id),
            is_streaming: self.is_streaming,
        }
    }
}

/// Cloneable handle to a conversation's state.
///
/// Clones share the same state. Readers either take a [`Snapshot`] or
/// [`subscribe`](Self::subscribe) to be notified of every replacement.
#[derive(Debug, Clone)]
pub struct Conversation {
    inner: Arc<ConversationInner>,
}

#[derive(Debug)]
struct ConversationInner {
    state: watch::Sender<Snapshot>,
}

impl Conversation {
    /// Create an empty conversation on the given thread.
    #[must_use]
    pub fn new(thread_id: impl AsRef<str>) -> Self {
        let (state, _) = watch::channel(Snapshot::empty(thread_id.as_ref()));
        Self {
            inner: Arc::new(ConversationInner { state }),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to snapshot replacements.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.state.subscribe()
    }

    /// Snapshots as a stream, starting with the current one.
    #[must_use]
    pub fn updates(&self) -> WatchStream<Snapshot> {
        WatchStream::new(self.subscribe())
    }

    /// Append a message to the end of the conversation.
    pub fn append(&self, message: Message) -> MessageId {
        let id = message.id;
        self.inner.state.send_modify(|state| {
            let mut messages = state.messages.to_vec();
            messages.push(message);
            *state = state.with_messages(messages);
        });
        id
    }

    /// Start an assistant turn.
    ///
    /// Appends the user message and an empty streaming assistant placeholder
    /// and raises the streaming flag, all in one replacement. Returns `None`
    /// without touching anything if a turn is already streaming.
    pub fn begin_turn(&self, user_text: impl Into<String>) -> Option<(MessageId, MessageId)> {
        let user = Message::user(user_text);
        let placeholder = Message::assistant_placeholder();
        let ids = (user.id, placeholder.id);

        let started = self.inner.state.send_if_modified(|state| {
            if state.is_streaming {
                return false;
            }
            let mut messages = state.messages.to_vec();
            messages.push(user);
            messages.push(placeholder);
            let mut next = state.with_messages(messages);
            next.is_streaming = true;
            *state = next;
            true
        });

        started.then_some(ids)
    }

    /// Apply a patch to the message with the given id.
    ///
    /// Returns `false` if no message has that id.
    pub fn update_by_id(&self, id: MessageId, patch: MessagePatch) -> bool {
        self.inner.state.send_if_modified(|state| {
            if state.get(id).is_none() {
                return false;
            }
            let messages = state
                .messages
                .iter()
                .map(|m| if m.id == id { m.patched(&patch) } else { m.clone() })
                .collect();
            *state = state.with_messages(messages);
            true
        })
    }

    /// Set the conversation-level streaming flag.
    pub fn set_streaming(&self, is_streaming: bool) {
        self.inner.state.send_if_modified(|state| {
            if state.is_streaming == is_streaming {
                return false;
            }
            let mut next = state.clone();
            next.is_streaming = is_streaming;
            *state = next;
            true
        });
    }

    /// Clear all messages and move to a new thread.
    ///
    /// The new thread id is derived from the current time and is always
    /// different from the one it replaces. Returns the new id.
    pub fn reset(&self) -> String {
        let mut thread_id = String::new();
        self.inner.state.send_modify(|state| {
            thread_id = fresh_thread_id(&state.thread_id);
            *state = Snapshot::empty(&thread_id);
        });
        tracing::info!(name: "conversation.reset", thread_id = %thread_id, "Started new conversation");
        thread_id
    }

    /// Whether an assistant turn is in flight.
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.inner.state.borrow().is_streaming
    }

    /// Current thread identifier.
    #[must_use]
    pub fn thread_id(&self) -> String {
        self.inner.state.borrow().thread_id.to_string()
    }

    /// Copy of all messages.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.inner.state.borrow().messages.to_vec()
    }

    /// Look up a message by id.
    #[must_use]
    pub fn get(&self, id: MessageId) -> Option<Message> {
        self.inner.state.borrow().get(id).cloned()
    }

    /// Most recent message.
    #[must_use]
    pub fn last(&self) -> Option<Message> {
        self.inner.state.borrow().messages.last().cloned()
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.borrow().len()
    }

    /// Check if there are no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `thread_<unix millis>`, bumped until it differs from `previous`.
fn fresh_thread_id(previous: &str) -> String {
    let mut millis = Utc::now().timestamp_millis();
    loop {
        let candidate = format!("thread_{millis}");
        if candidate != previous {
            return candidate;
        }
        millis += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Role;

    #[test]
    fn test_conversation_lifecycle() {
        let conversation = Conversation::new("default");

        assert_eq!(conversation.thread_id(), "default");
        assert!(conversation.is_empty());

        conversation.append(Message::user("Hello"));
        assert_eq!(conversation.len(), 1);

        let id = conversation.append(Message::assistant_placeholder());
        assert_eq!(conversation.len(), 2);

        assert!(conversation.update_by_id(id, MessagePatch::failed("Hi there!")));

        let messages = conversation.messages();
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "Hi there!");
        assert!(!messages[1].is_streaming);
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let conversation = Conversation::new("default");
        conversation.append(Message::user("Hello"));
        let before = conversation.snapshot();

        let stray = Message::user("not appended");
        assert!(!conversation.update_by_id(stray.id, MessagePatch::content("x")));
        assert_eq!(conversation.snapshot(), before);
    }

    #[test]
    fn test_old_snapshots_are_not_mutated() {
        let conversation = Conversation::new("default");
        let id = conversation.append(Message::assistant_placeholder());
        let before = conversation.snapshot();

        conversation.update_by_id(id, MessagePatch::content("partial"));

        assert_eq!(before.get(id).unwrap().content, "");
        assert_eq!(conversation.get(id).unwrap().content, "partial");
    }

    #[test]
    fn test_begin_turn_refused_while_streaming() {
        let conversation = Conversation::new("default");

        let (user_id, assistant_id) = conversation.begin_turn("Hello").unwrap();
        assert!(conversation.is_streaming());
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.get(user_id).unwrap().role, Role::User);
        assert!(conversation.get(assistant_id).unwrap().is_streaming);

        assert!(conversation.begin_turn("again").is_none());
        assert_eq!(conversation.len(), 2);

        conversation.update_by_id(assistant_id, MessagePatch::finished());
        conversation.set_streaming(false);
        assert!(conversation.begin_turn("again").is_some());
        assert_eq!(conversation.len(), 4);
    }

    #[test]
    fn test_reset_clears_and_changes_thread() {
        let conversation = Conversation::new("default");
        conversation.append(Message::user("Hello"));

        let first = conversation.reset();
        assert!(conversation.is_empty());
        assert_ne!(first, "default");
        assert!(first.starts_with("thread_"));

        // Same millisecond still yields a distinct id.
        let second = conversation.reset();
        assert_ne!(first, second);
        assert_eq!(conversation.thread_id(), second);
    }

    #[test]
    fn test_fresh_thread_id_bumps_on_collision() {
        let now = fresh_thread_id("");
        let next = fresh_thread_id(&now);
        assert_ne!(now, next);
    }

    #[tokio::test]
    async fn test_subscribers_see_replacements() {
        let conversation = Conversation::new("default");
        let mut rx = conversation.subscribe();

        conversation.append(Message::user("Hello"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().len(), 1);

        conversation.set_streaming(true);
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_streaming());
    }

    #[tokio::test]
    async fn test_updates_stream_starts_with_current() {
        use tokio_stream::StreamExt;

        let conversation = Conversation::new("default");
        conversation.append(Message::user("Hello"));
        let mut updates = conversation.updates();

        let first = updates.next().await.unwrap();
        assert_eq!(first.len(), 1);

        conversation.reset();
        let second = updates.next().await.unwrap();
        assert!(second.is_empty());
        assert_ne!(second.thread_id(), "default");
    }
}
