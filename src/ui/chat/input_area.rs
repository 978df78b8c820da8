//! Chat input area: control enablement and command parsing.

/// Enablement of the input controls for the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    /// The text input accepts typing.
    pub input_enabled: bool,
    /// The send action is available.
    pub send_enabled: bool,
    /// The new chat action is available.
    pub new_chat_enabled: bool,
}

impl Controls {
    /// Compute control state from the current input and streaming flag.
    ///
    /// Send needs non-blank input and no reply in flight; input and new chat
    /// are only blocked while a reply streams.
    pub fn compute(input: &str, is_streaming: bool) -> Self {
        Self {
            input_enabled: !is_streaming,
            send_enabled: !is_streaming && !input.trim().is_empty(),
            new_chat_enabled: !is_streaming,
        }
    }
}

/// A line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Send the text as a message.
    Send(String),
    /// Start a new chat.
    NewChat,
    /// Print the whole transcript.
    History,
    /// Show the command list.
    Help,
    /// Leave.
    Quit,
    /// Nothing to do.
    Empty,
}

/// Help text listing the prompt commands.
pub const HELP: &str = "\
Commands:
  /new      start a new chat
  /history  show the conversation
  /help     show this help
  /quit     exit
Anything else is sent as a message.
";

/// Interpret one line of input.
pub fn parse_command(line: &str) -> Command {
    match line.trim() {
        "" => Command::Empty,
        "/new" => Command::NewChat,
        "/history" => Command::History,
        "/help" => Command::Help,
        "/quit" | "/exit" => Command::Quit,
        _ => Command::Send(line.to_string()),
    }
}
