//! Line reassembly over a chunked body.

/// Splits a byte stream into text lines.
///
/// Bytes are buffered until a `\n` arrives, so a line cut by a network read
/// boundary is returned whole on the read that completes it. Splitting on the
/// newline byte never cuts a UTF-8 sequence, which makes the decode of each
/// complete line safe. A trailing `\r` is dropped.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    /// Create an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every line it completes.
    ///
    /// Only the new bytes are searched; the buffered remainder is known to
    /// hold no newline.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let scanned = self.buf.len();
        self.buf.extend_from_slice(chunk);

        let Some(last) = self.buf[scanned..].iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };
        let complete: Vec<u8> = self.buf.drain(..=scanned + last).collect();
        complete[..complete.len() - 1]
            .split(|&b| b == b'\n')
            .map(decode_line)
            .collect()
    }

    /// Return the unterminated remainder, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let raw = std::mem::take(&mut self.buf);
        Some(decode_line(&raw))
    }

    /// Number of buffered bytes not yet returned as a line.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
