//! Chat-specific terminal components.
//!
//! These components render the conversation and drive the prompt loop on top
//! of a [`ChatSession`](crate::turn::ChatSession).

mod header;
mod input_area;
mod message_list;
mod shell;

pub use header::{TITLE, render_header};
pub use input_area::{Command, Controls, HELP, parse_command};
pub use message_list::{
    StreamPrinter, TYPING_INDICATOR, WELCOME, render_message, render_transcript, role_label,
};
pub use shell::ChatShell;
