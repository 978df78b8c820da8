//! Incremental parsing of the backend's event stream.
//!
//! The backend answers a chat request with a chunked body in which each line
//! may be `data: <json>`. This module turns raw body bytes into
//! [`StreamEvent`]s:
//!
//! - [`LineDecoder`] reassembles lines (and UTF-8 characters) that were split
//!   across network reads
//! - [`parse_data_line`] recognizes the `data: ` prefix and parses the payload
//! - [`events`] drives both over a byte stream, skipping malformed lines
//!
//! # Example
//!
//! ```rust
//! use chat_stream_client::stream::{StreamEvent, parse_data_line};
//!
//! let event = parse_data_line(r#"data: {"type":"chunk","content":"Hi"}"#)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(event, StreamEvent::Chunk { content: "Hi".to_string() });
//! assert!(parse_data_line("event: ping").is_none());
//! ```

mod decoder;
mod event;

pub use decoder::LineDecoder;
pub use event::{DATA_PREFIX, StreamEvent, parse_data_line, sse_line};

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::error::{ChatError, Result};

/// Turn a stream of body chunks into parsed events.
///
/// Lines without the `data: ` prefix are ignored. Lines whose payload fails to
/// parse are logged and skipped. Errors from the underlying byte stream end
/// the event stream with that error.
pub fn events<S>(bytes: S) -> impl Stream<Item = Result<StreamEvent>> + Send
where
    S: Stream<Item = Result<Bytes>> + Send + 'static,
{
    async_stream::try_stream! {
        let mut decoder = LineDecoder::new();

        futures::pin_mut!(bytes);
        while let Some(chunk) = bytes.next().await {
            let chunk = chunk?;
            for line in decoder.push(&chunk) {
                if let Some(event) = parse_logged(&line) {
                    yield event;
                }
            }
        }

        if let Some(line) = decoder.finish() {
            if let Some(event) = parse_logged(&line) {
                yield event;
            }
        }
    }
}

/// Read events until the reply is finished and return its full text.
///
/// Stops at `complete` or at the end of the stream; an `error` event becomes
/// [`ChatError::Server`].
pub async fn collect_reply<S>(events: S) -> Result<String>
where
    S: Stream<Item = Result<StreamEvent>>,
{
    futures::pin_mut!(events);
    let mut reply = String::new();
    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::Chunk { content } => reply.push_str(&content),
            StreamEvent::Complete => break,
            StreamEvent::Error { message } => return Err(ChatError::Server(message)),
        }
    }
    Ok(reply)
}

fn parse_logged(line: &str) -> Option<StreamEvent> {
    match parse_data_line(line)? {
        Ok(event) => Some(event),
        Err(ChatError::Json(e)) => {
            tracing::warn!(
                name: "stream.line.malformed",
                error = %e,
                line = %line,
                "Error parsing stream data, skipping line"
            );
            None
        }
        Err(e) => {
            tracing::warn!(name: "stream.line.malformed", error = %e, "Skipping stream line");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(parts: &[&'static str]) -> impl Stream<Item = Result<Bytes>> + Send + 'static {
        let parts: Vec<Result<Bytes>> = parts
            .iter()
            .map(|p| Ok(Bytes::from_static(p.as_bytes())))
            .collect();
        futures::stream::iter(parts)
    }

    async fn collect(parts: &[&'static str]) -> Vec<Result<StreamEvent>> {
        events(body(parts)).collect().await
    }

    #[tokio::test]
    async fn test_events_from_single_read() {
        let got = collect(&[
            "data: {\"type\":\"chunk\",\"content\":\"Hi\"}\n\ndata: {\"type\":\"complete\"}\n\n",
        ])
        .await;

        let got: Vec<StreamEvent> = got.into_iter().map(|e| e.unwrap()).collect();
        assert_eq!(
            got,
            vec![
                StreamEvent::Chunk {
                    content: "Hi".to_string()
                },
                StreamEvent::Complete,
            ]
        );
    }

    #[tokio::test]
    async fn test_event_split_across_reads() {
        let got = collect(&["data: {\"type\":\"ch", "unk\",\"content\":\"Hel", "lo\"}\n"]).await;

        assert_eq!(got.len(), 1);
        assert_eq!(
            got[0].as_ref().unwrap(),
            &StreamEvent::Chunk {
                content: "Hello".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_malformed_and_foreign_lines_are_skipped() {
        let got = collect(&[
            ": keep-alive\n",
            "event: message\n",
            "data: {not json}\n",
            "data: {\"type\":\"unknown\"}\n",
            "data: {\"type\":\"chunk\",\"content\":\"ok\"}\n",
        ])
        .await;

        assert_eq!(got.len(), 1);
        assert!(matches!(got[0], Ok(StreamEvent::Chunk { .. })));
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let got = collect(&["data: {\"type\":\"complete\"}"]).await;
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].as_ref().unwrap(), &StreamEvent::Complete);
    }

    #[tokio::test]
    async fn test_collect_reply_stops_at_complete() {
        let reply = collect_reply(events(body(&[
            "data: {\"type\":\"chunk\",\"content\":\"Hi\"}\n",
            "data: {\"type\":\"chunk\",\"content\":\" there\"}\n",
            "data: {\"type\":\"complete\"}\n",
            "data: {\"type\":\"chunk\",\"content\":\"ignored\"}\n",
        ])))
        .await
        .unwrap();
        assert_eq!(reply, "Hi there");
    }

    #[tokio::test]
    async fn test_collect_reply_error_event() {
        let err = collect_reply(events(body(&[
            "data: {\"type\":\"error\",\"message\":\"quota\"}\n",
        ])))
        .await
        .unwrap_err();
        assert!(matches!(err, ChatError::Server(m) if m == "quota"));
    }

    #[tokio::test]
    async fn test_transport_error_is_propagated() {
        let parts: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"data: {\"type\":\"chunk\",\"content\":\"a\"}\n")),
            Err(ChatError::Server("connection reset".to_string())),
        ];
        let got: Vec<Result<StreamEvent>> = events(futures::stream::iter(parts)).collect().await;

        assert_eq!(got.len(), 2);
        assert!(got[0].is_ok());
        assert!(matches!(got[1], Err(ChatError::Server(_))));
    }
}
