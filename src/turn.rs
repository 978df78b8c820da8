//! One assistant turn: send the user's text and stream the reply into the
//! conversation.
//!
//! A turn appends the user message and an empty assistant placeholder, opens a
//! single request, and drives the placeholder through
//! [`PlaceholderState`]: `Pending` → `Streaming` (once per chunk, with growing
//! text) → `Done` or `Failed`. Any failure replaces the placeholder content with
//! [`ERROR_MESSAGE`]. Either way the conversation leaves the turn with its
//! streaming flag cleared, ready for the next one. There are no retries.

use futures::StreamExt;
use tracing::Instrument;
use uuid::Uuid;

use crate::client::{ChatRequest, ChatTransport};
use crate::conversation::{Conversation, MessageId, MessagePatch};
use crate::error::{ChatError, Result};
use crate::stream::{self, StreamEvent};

/// Text shown in place of the assistant reply when a turn fails.
pub const ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Lifecycle of the assistant placeholder within one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderState {
    /// Created, nothing received yet.
    Pending,
    /// Receiving chunks; holds the text accumulated so far.
    Streaming(String),
    /// Finished normally with the final text.
    Done(String),
    /// Finished with an error; holds the text shown to the user.
    Failed(String),
}

impl PlaceholderState {
    /// Append a chunk. Terminal states ignore further chunks.
    #[must_use]
    pub fn push_chunk(self, chunk: &str) -> Self {
        match self {
            Self::Pending => Self::Streaming(chunk.to_string()),
            Self::Streaming(mut text) => {
                text.push_str(chunk);
                Self::Streaming(text)
            }
            terminal => terminal,
        }
    }

    /// Finish normally, keeping whatever text has arrived.
    #[must_use]
    pub fn complete(self) -> Self {
        match self {
            Self::Pending => Self::Done(String::new()),
            Self::Streaming(text) => Self::Done(text),
            terminal => terminal,
        }
    }

    /// Finish with an error message.
    #[must_use]
    pub fn fail(self, message: impl Into<String>) -> Self {
        match self {
            Self::Pending | Self::Streaming(_) => Self::Failed(message.into()),
            terminal => terminal,
        }
    }

    /// Text the placeholder currently shows.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Pending => "",
            Self::Streaming(text) | Self::Done(text) | Self::Failed(text) => text,
        }
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }
}

/// Result of asking for a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Input was empty after trimming; nothing was appended or sent.
    Skipped,
    /// Another turn is still streaming; nothing was appended or sent.
    Busy,
    /// The turn ran to a terminal state.
    Finished {
        /// The user message that was appended.
        user_id: MessageId,
        /// The assistant message that was streamed into.
        assistant_id: MessageId,
        /// Terminal placeholder state.
        state: PlaceholderState,
    },
}

/// A conversation bound to a backend transport.
#[derive(Debug)]
pub struct ChatSession<T> {
    conversation: Conversation,
    transport: T,
}

impl<T: ChatTransport> ChatSession<T> {
    /// Create a session over an existing conversation.
    pub fn new(conversation: Conversation, transport: T) -> Self {
        Self {
            conversation,
            transport,
        }
    }

    /// The conversation this session updates.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The transport used for requests.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send the user's text and stream the reply into the conversation.
    pub async fn send(&self, text: &str) -> TurnOutcome {
        self.run_turn(text, TurnMode::Streaming).await
    }

    /// Send the user's text and fill the reply in one step, without streaming.
    pub async fn send_without_streaming(&self, text: &str) -> TurnOutcome {
        self.run_turn(text, TurnMode::Whole).await
    }

    /// Clear the conversation and move to a new thread.
    ///
    /// Refused while a turn is streaming. Returns the new thread id.
    pub fn new_chat(&self) -> Option<String> {
        if self.conversation.is_streaming() {
            tracing::warn!("New chat refused while a reply is streaming");
            return None;
        }
        Some(self.conversation.reset())
    }

    async fn run_turn(&self, text: &str, mode: TurnMode) -> TurnOutcome {
        if text.trim().is_empty() {
            return TurnOutcome::Skipped;
        }

        let Some((user_id, assistant_id)) = self.conversation.begin_turn(text) else {
            tracing::warn!("Turn refused while a reply is streaming");
            return TurnOutcome::Busy;
        };
        let guard = TurnGuard::new(&self.conversation, assistant_id);

        let request_id = Uuid::new_v4().to_string();
        let req = ChatRequest {
            message: text.to_string(),
            thread_id: self.conversation.thread_id(),
        };
        let span = tracing::info_span!(
            "turn",
            request_id = %request_id,
            thread_id = %req.thread_id,
            message_id = %assistant_id,
        );

        let state = async {
            tracing::info!(name: "turn.started", message_length = text.len(), "Sending message");

            let result = match mode {
                TurnMode::Streaming => self.stream_reply(&req, assistant_id).await,
                TurnMode::Whole => self.whole_reply(&req, assistant_id).await,
            };

            match result {
                Ok(state) => {
                    self.conversation
                        .update_by_id(assistant_id, MessagePatch::finished());
                    tracing::info!(
                        name: "turn.completed",
                        content_length = state.text().len(),
                        "Reply complete"
                    );
                    state
                }
                Err(e) => {
                    tracing::error!(name: "turn.failed", error = %e, "Error sending message");
                    self.conversation
                        .update_by_id(assistant_id, MessagePatch::failed(ERROR_MESSAGE));
                    PlaceholderState::Pending.fail(ERROR_MESSAGE)
                }
            }
        }
        .instrument(span)
        .await;

        self.conversation.set_streaming(false);
        guard.disarm();

        TurnOutcome::Finished {
            user_id,
            assistant_id,
            state,
        }
    }

    /// Read the stream, growing the placeholder with every chunk.
    async fn stream_reply(
        &self,
        req: &ChatRequest,
        assistant_id: MessageId,
    ) -> Result<PlaceholderState> {
        let body = self.transport.open_stream(req).await?;
        let events = stream::events(body);
        futures::pin_mut!(events);

        let mut state = PlaceholderState::Pending;
        while let Some(event) = events.next().await {
            match event? {
                StreamEvent::Chunk { content } => {
                    if content.is_empty() {
                        continue;
                    }
                    state = state.push_chunk(&content);
                    self.conversation
                        .update_by_id(assistant_id, MessagePatch::content(state.text()));
                    tracing::trace!(delta_length = content.len(), "Chunk received");
                }
                StreamEvent::Complete => return Ok(state.complete()),
                StreamEvent::Error { message } => return Err(ChatError::Server(message)),
            }
        }

        tracing::debug!("Stream ended without a complete event");
        Ok(state.complete())
    }

    /// Wait for the full reply and set it in one update.
    async fn whole_reply(
        &self,
        req: &ChatRequest,
        assistant_id: MessageId,
    ) -> Result<PlaceholderState> {
        let reply = self.transport.chat(req).await?;
        let state = PlaceholderState::Pending.push_chunk(&reply.message).complete();
        self.conversation
            .update_by_id(assistant_id, MessagePatch::content(state.text()));
        Ok(state)
    }
}

/// Fails the placeholder and clears the streaming flag if a turn is dropped
/// before it settles.
struct TurnGuard<'a> {
    conversation: &'a Conversation,
    assistant_id: MessageId,
    armed: bool,
}

impl<'a> TurnGuard<'a> {
    fn new(conversation: &'a Conversation, assistant_id: MessageId) -> Self {
        Self {
            conversation,
            assistant_id,
            armed: true,
        }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for TurnGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!(
            name: "turn.dropped",
            message_id = %self.assistant_id,
            "Turn dropped before it finished"
        );
        self.conversation
            .update_by_id(self.assistant_id, MessagePatch::failed(ERROR_MESSAGE));
        self.conversation.set_streaming(false);
    }
}

#[derive(Debug, Clone, Copy)]
enum TurnMode {
    Streaming,
    Whole,
}
