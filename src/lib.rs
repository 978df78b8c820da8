//! Streaming chat client.
//!
//! A conversation front end for a chat backend that streams its replies as
//! `data: <json>` lines over a chunked HTTP response. The client keeps the
//! conversation in memory, sends one request per user turn, and grows the
//! assistant reply in place as chunks arrive.
//!
//! # Architecture
//!
//! - **Conversation State Store**: ordered messages, thread id and streaming
//!   flag, replaced immutably and published to subscribers
//! - **Stream Ingestion Loop**: one request per turn; decodes the body into
//!   events and drives the assistant placeholder to done or failed
//! - **Terminal UI**: prompt loop with send / new chat commands
//!
//! # Modules
//!
//! - [`config`]: CLI flags and layered configuration
//! - [`conversation`]: Message model and state store
//! - [`stream`]: Line decoding and event parsing
//! - [`client`]: HTTP transport for the backend
//! - [`turn`]: The per-turn ingestion loop
//! - [`ui`]: Terminal rendering and prompt loop

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]

pub mod client;
pub mod config;
pub mod conversation;
pub mod error;
pub mod stream;
pub mod turn;
pub mod ui;

pub use client::{ChatReply, ChatRequest, ChatTransport, HealthStatus, HttpChatClient};
pub use conversation::{Conversation, Message, MessageId, MessagePatch, Role, Snapshot};
pub use error::{ChatError, Result};
pub use stream::StreamEvent;
pub use turn::{ChatSession, ERROR_MESSAGE, PlaceholderState, TurnOutcome};
