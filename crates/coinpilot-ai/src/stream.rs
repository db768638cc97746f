//! Streaming fragment types and the response accumulator

use std::pin::Pin;

use futures::StreamExt;
use tokio_stream::Stream;

use crate::{delta::delta_fragments, error::Result, framing::frame_lines, sanitize::sanitize};

/// A stream of sanitized text fragments, in arrival order
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Run raw body chunks through framing, delta extraction and sanitizing.
pub fn fragment_stream<S, B>(chunks: S) -> FragmentStream
where
    S: Stream<Item = Result<B>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let fragments = delta_fragments(frame_lines(chunks));
    Box::pin(fragments.map(|fragment| fragment.map(|text| sanitize(&text))))
}

/// Running buffer for one assistant reply.
#[derive(Debug, Default, Clone)]
pub struct StreamAccumulator {
    buffer: String,
}

impl StreamAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment verbatim and return the text so far
    pub fn append(&mut self, fragment: &str) -> &str {
        self.buffer.push_str(fragment);
        &self.buffer
    }

    /// Final reply text with surrounding whitespace trimmed
    pub fn finalize(&self) -> String {
        self.buffer.trim().to_string()
    }

    /// Untrimmed text so far
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_append_returns_running_buffer() {
        let mut acc = StreamAccumulator::new();
        assert_eq!(acc.append("Hi"), "Hi");
        assert_eq!(acc.append(" there"), "Hi there");
    }

    #[test]
    fn test_append_keeps_whitespace_until_finalize() {
        let mut acc = StreamAccumulator::new();
        acc.append("\n  Hello");
        acc.append(" world  \n");
        assert_eq!(acc.buffer(), "\n  Hello world  \n");
        assert_eq!(acc.finalize(), "Hello world");
        // finalize does not reset
        assert_eq!(acc.buffer(), "\n  Hello world  \n");
    }

    #[test]
    fn test_buffer_is_concatenation_and_never_shrinks() {
        let fragments = ["a", "", "bc", " ", "• d", "\n", "éf"];
        let mut acc = StreamAccumulator::new();
        let mut expected = String::new();
        let mut last_len = 0;
        for fragment in fragments {
            expected.push_str(fragment);
            let current = acc.append(fragment).to_string();
            assert_eq!(current, expected);
            assert!(current.len() >= last_len);
            last_len = current.len();
        }
        assert_eq!(acc.len(), expected.len());
    }

    #[test]
    fn test_empty_accumulator() {
        let acc = StreamAccumulator::new();
        assert!(acc.is_empty());
        assert_eq!(acc.finalize(), "");
    }

    #[tokio::test]
    async fn test_fragment_stream_pipeline() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"*Bull\"}}]}\n",
            "\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"ish* **trend**\"}}]}\n",
            ": ping\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"\\n- RSI *68*\"}}]}\n",
            "data: [DONE]\n",
        );
        let bytes = body.as_bytes().to_vec();
        let (first, rest) = bytes.split_at(37);
        let chunks = tokio_stream::iter(vec![
            Ok::<_, Error>(first.to_vec()),
            Ok(rest.to_vec()),
        ]);

        let fragments: Vec<String> = fragment_stream(chunks)
            .map(|f| f.unwrap())
            .collect()
            .await;

        // a pair split across fragments is not recognized
        assert_eq!(fragments, vec!["*Bull", "ish* trend", "\n• RSI 68"]);
    }

    #[tokio::test]
    async fn test_fragment_stream_surfaces_transport_error() {
        let chunks = tokio_stream::iter(vec![
            Ok::<_, Error>(b"data: {\"choices\":[{\"delta\":{\"content\":\"x\"}}]}\n".to_vec()),
            Err(Error::Stream("reset".into())),
        ]);
        let items: Vec<_> = fragment_stream(chunks).collect().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), "x");
        assert!(matches!(items[1], Err(Error::Stream(_))));
    }
}
