//! Conversation state management.
//!
//! This module holds the in-memory state of one chat conversation: the ordered
//! message list, the thread identifier shared with the backend, and the
//! conversation-level streaming flag.
//!
//! # Architecture
//!
//! - [`Message`]: A single user or assistant message
//! - [`Conversation`]: Cloneable handle to the state store
//! - [`Snapshot`]: Immutable view of the state published on every change
//!
//! # Example
//!
//! ```rust
//! use chat_stream_client::conversation::{Conversation, Message, MessagePatch};
//!
//! let conversation = Conversation::new("default");
//! let id = conversation.append(Message::assistant_placeholder());
//! conversation.update_by_id(id, MessagePatch::content("Hi"));
//!
//! let messages = conversation.messages();
//! assert_eq!(messages.len(), 1);
//! assert_eq!(messages[0].content, "Hi");
//! ```

mod message;
mod store;

pub use message::{Message, MessageId, MessagePatch, Role};
pub use store::{Conversation, Snapshot};
