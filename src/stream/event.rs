//! Stream event records.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Prefix that marks a line as carrying an event record.
pub const DATA_PREFIX: &str = "data: ";

/// A single event record sent by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Text fragment to append to the assistant reply.
    Chunk {
        /// The text fragment.
        #[serde(default)]
        content: String,
    },
    /// The assistant reply is finished.
    Complete,
    /// The backend failed while producing the reply.
    Error {
        /// Description of the failure.
        #[serde(default)]
        message: String,
    },
}

/// Parse one line of the response body.
///
/// Returns `None` for lines that do not start with [`DATA_PREFIX`], and
/// `Some(Err(..))` when the payload after the prefix is not a valid event.
pub fn parse_data_line(line: &str) -> Option<Result<StreamEvent>> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    Some(serde_json::from_str(payload).map_err(Into::into))
}

/// Encode an event as a `data:` record followed by a blank line.
pub fn sse_line(event: &StreamEvent) -> String {
    let json = serde_json::to_string(event).unwrap_or_else(|e| {
        serde_json::json!({ "type": "error", "message": e.to_string() }).to_string()
    });
    format!("{DATA_PREFIX}{json}\n\n")
}
