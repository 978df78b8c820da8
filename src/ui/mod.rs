//! Terminal user interface.
//!
//! # Structure
//!
//! - [`chat`]: header, input controls, message list and the interactive shell

pub mod chat;
