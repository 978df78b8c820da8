//! Interactive chat shell.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::{
    Command, Controls, HELP, StreamPrinter, parse_command, render_header, render_transcript,
};
use crate::client::ChatTransport;
use crate::error::Result;
use crate::turn::{ChatSession, PlaceholderState, TurnOutcome};

const PROMPT: &str = "> ";

/// Terminal front end for a [`ChatSession`].
///
/// Reads lines from `input`, writes the conversation to `output`. While a
/// reply is streaming no input is read, which is how the send and new chat
/// controls stay disabled mid-stream.
#[derive(Debug)]
pub struct ChatShell<T> {
    session: ChatSession<T>,
    streaming: bool,
}

impl<T: ChatTransport> ChatShell<T> {
    /// Create a shell; `streaming` selects the streaming endpoint.
    pub fn new(session: ChatSession<T>, streaming: bool) -> Self {
        Self { session, streaming }
    }

    /// The underlying session.
    pub fn session(&self) -> &ChatSession<T> {
        &self.session
    }

    /// Run the interactive loop until `/quit` or end of input.
    pub async fn run<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let snapshot = self.session.conversation().snapshot();
        write(
            &mut output,
            &render_header(snapshot.thread_id(), snapshot.is_streaming()),
        )
        .await?;
        write(&mut output, &render_transcript(&snapshot)).await?;
        write(&mut output, PROMPT).await?;

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            match parse_command(&line) {
                Command::Empty => {}
                Command::Quit => break,
                Command::Help => write(&mut output, HELP).await?,
                Command::History => {
                    let snapshot = self.session.conversation().snapshot();
                    write(&mut output, &render_transcript(&snapshot)).await?;
                }
                Command::NewChat => match self.session.new_chat() {
                    Some(thread_id) => {
                        write(&mut output, &render_header(&thread_id, false)).await?;
                        write(&mut output, &render_transcript(&self.session.conversation().snapshot()))
                            .await?;
                    }
                    None => write(&mut output, "A reply is still streaming.\n").await?,
                },
                Command::Send(text) => {
                    self.turn(&text, &mut output).await?;
                }
            }
            write(&mut output, PROMPT).await?;
        }

        Ok(())
    }

    /// Send one message, print the reply, and report whether it succeeded.
    pub async fn run_once<W>(&self, text: &str, mut output: W) -> Result<bool>
    where
        W: AsyncWrite + Unpin,
    {
        let outcome = self.turn(text, &mut output).await?;
        Ok(matches!(
            outcome,
            TurnOutcome::Finished {
                state: PlaceholderState::Done(_),
                ..
            }
        ))
    }

    /// Run a turn, printing the reply as it grows.
    async fn turn<W>(&self, text: &str, output: &mut W) -> Result<TurnOutcome>
    where
        W: AsyncWrite + Unpin,
    {
        let conversation = self.session.conversation();
        if !Controls::compute(text, conversation.is_streaming()).send_enabled {
            return Ok(TurnOutcome::Skipped);
        }

        let mut rx = conversation.subscribe();
        let mut printer = StreamPrinter::default();
        write(output, "Assistant: ").await?;

        let turn = async {
            if self.streaming {
                self.session.send(text).await
            } else {
                self.session.send_without_streaming(text).await
            }
        };
        tokio::pin!(turn);

        // A failed write stops printing but the turn still runs to the end,
        // so the conversation is never left streaming.
        let mut write_error = None;
        let outcome = loop {
            tokio::select! {
                outcome = &mut turn => break outcome,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break (&mut turn).await;
                    }
                    let snapshot = rx.borrow_and_update().clone();
                    if write_error.is_none()
                        && let Some(delta) = printer.delta(&snapshot)
                        && let Err(e) = write(output, &delta).await
                    {
                        write_error = Some(e);
                    }
                }
            }
        };
        if let Some(e) = write_error {
            return Err(e);
        }

        // Catch up on anything published after the last wakeup.
        if let Some(delta) = printer.delta(&conversation.snapshot()) {
            write(output, &delta).await?;
        }

        if let TurnOutcome::Finished { assistant_id, .. } = &outcome
            && let Some(reply) = conversation.get(*assistant_id)
        {
            write(output, &format!("\n    {}\n", reply.timestamp)).await?;
        }

        Ok(outcome)
    }
}

async fn write<W>(output: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
