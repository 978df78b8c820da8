//! Chat header.

/// Title shown at the top of the chat.
pub const TITLE: &str = "AI Chat Interface";

/// Header line with title, thread and status.
pub fn render_header(thread_id: &str, is_streaming: bool) -> String {
    let status = if is_streaming { "Streaming..." } else { "Ready" };
    format!("{TITLE}  [thread {thread_id}]  {status}\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_status() {
        assert!(render_header("default", false).contains("Ready"));
        let busy = render_header("thread_1", true);
        assert!(busy.contains("thread_1"));
        assert!(busy.contains("Streaming"));
    }
}
