//! Line framing for chunked response bodies
//!
//! Transports hand over bytes in arbitrary chunks. [`LineFramer`] buffers
//! them and hands back complete lines, carrying partial lines (and partial
//! UTF-8 sequences) across chunk boundaries.

use async_stream::stream;
use futures::StreamExt;
use tokio_stream::Stream;

/// Incremental splitter from raw bytes to lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    buffer: Vec<u8>,
    /// Prefix of `buffer` already known to hold no `\n`
    scanned: usize,
}

impl LineFramer {
    /// Create an empty framer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk and return every line it completes, in order.
    ///
    /// Lines exclude their `\n` terminator and a preceding `\r`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        let mut from = self.scanned;
        while let Some(offset) = self.buffer[from..].iter().position(|&b| b == b'\n') {
            let end = from + offset;
            lines.push(decode_line(&self.buffer[start..end]));
            start = end + 1;
            from = start;
        }
        self.buffer.drain(..start);
        self.scanned = self.buffer.len();

        lines
    }

    /// Flush the trailing partial line at end of stream, if non-empty.
    pub fn finish(self) -> Option<String> {
        let rest = decode_line(&self.buffer);
        if rest.is_empty() { None } else { Some(rest) }
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Turn a stream of byte chunks into a lazy stream of lines.
///
/// A chunk error is forwarded as-is and ends the stream; the partial line
/// buffered at that point is dropped.
pub fn frame_lines<S, B, E>(chunks: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    stream! {
        let mut chunks = std::pin::pin!(chunks);
        let mut framer = LineFramer::new();

        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(bytes) => {
                    for line in framer.push(bytes.as_ref()) {
                        yield Ok(line);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        if let Some(rest) = framer.finish() {
            yield Ok(rest);
        }
    }
}
