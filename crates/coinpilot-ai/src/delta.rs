//! Extraction of incremental text from `data: ` stream lines

use async_stream::stream;
use futures::StreamExt;
use serde::Deserialize;
use tokio_stream::Stream;

/// Prefix every content-bearing line starts with
pub const DATA_PREFIX: &str = "data: ";

/// Pull the text fragment out of one stream line.
///
/// Lines without the `data: ` prefix, payloads that are not JSON (including
/// the `[DONE]` sentinel), and chunks without a string at
/// `choices[0].delta.content` all yield `None`. Keep-alives and control
/// lines look exactly like that, so they are skipped rather than reported.
pub fn parse_delta_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix(DATA_PREFIX)?;

    match serde_json::from_str::<DeltaChunk>(payload) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content),
        Err(e) => {
            tracing::trace!("Skipping undecodable stream line: {}", e);
            None
        }
    }
}

/// Map a line stream to the fragments it carries. Errors pass through.
pub fn delta_fragments<S, E>(lines: S) -> impl Stream<Item = Result<String, E>>
where
    S: Stream<Item = Result<String, E>>,
{
    stream! {
        let mut lines = std::pin::pin!(lines);
        while let Some(line) = lines.next().await {
            match line {
                Ok(line) => {
                    if let Some(fragment) = parse_delta_line(&line) {
                        yield Ok(fragment);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeltaChunk {
    choices: Vec<DeltaChoice>,
}

#[derive(Debug, Deserialize)]
struct DeltaChoice {
    delta: Delta,
}

#[derive(Debug, Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_content() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#;
        assert_eq!(parse_delta_line(line).as_deref(), Some("Hi"));
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let line = r#"data: {"id":"c1","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"role":"assistant","content":" there"},"finish_reason":null}]}"#;
        assert_eq!(parse_delta_line(line).as_deref(), Some(" there"));
    }

    #[test]
    fn test_only_first_choice_is_used() {
        let line = r#"data: {"choices":[{"delta":{"content":"a"}},{"delta":{"content":"b"}}]}"#;
        assert_eq!(parse_delta_line(line).as_deref(), Some("a"));
    }

    #[test]
    fn test_missing_prefix_is_skipped() {
        assert!(parse_delta_line(r#"{"choices":[{"delta":{"content":"x"}}]}"#).is_none());
        assert!(parse_delta_line(r#"data:{"choices":[{"delta":{"content":"x"}}]}"#).is_none());
        assert!(parse_delta_line(": keep-alive").is_none());
        assert!(parse_delta_line("").is_none());
    }

    #[test]
    fn test_malformed_payloads_are_skipped() {
        assert!(parse_delta_line("data: not-json").is_none());
        assert!(parse_delta_line("data: [DONE]").is_none());
        assert!(parse_delta_line("data: {\"choices\":[{\"delta\":").is_none());
        assert!(parse_delta_line("data: ").is_none());
    }

    #[test]
    fn test_missing_or_wrong_type_field_is_skipped() {
        assert!(parse_delta_line(r#"data: {"choices":[]}"#).is_none());
        assert!(parse_delta_line(r#"data: {"choices":[{"delta":{}}]}"#).is_none());
        assert!(parse_delta_line(r#"data: {"choices":[{"delta":{"content":null}}]}"#).is_none());
        assert!(parse_delta_line(r#"data: {"choices":[{"delta":{"content":42}}]}"#).is_none());
        assert!(parse_delta_line(r#"data: {"usage":{"prompt_tokens":3}}"#).is_none());
    }

    #[test]
    fn test_empty_content_is_a_fragment() {
        let line = r#"data: {"choices":[{"delta":{"content":""}}]}"#;
        assert_eq!(parse_delta_line(line).as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_delta_fragments_skips_noise() {
        let lines = tokio_stream::iter(vec![
            Ok::<_, String>(r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#.to_string()),
            Ok(String::new()),
            Ok("data: not-json".to_string()),
            Ok(r#"data: {"choices":[{"delta":{"content":" there"}}]}"#.to_string()),
            Ok("data: [DONE]".to_string()),
        ]);
        let fragments: Vec<String> = delta_fragments(lines)
            .map(|f| f.unwrap())
            .collect()
            .await;
        assert_eq!(fragments, vec!["Hi", " there"]);
    }
}
