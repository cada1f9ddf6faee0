//! SSE parsing for streaming chat completions.
//!
//! Converts a raw `reqwest` byte stream into plain text deltas.
//! Handles `data: [DONE]`, partial lines, and buffering across chunk
//! boundaries. The stream terminates cleanly on the done marker.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::Stream;
use serde::Deserialize;

use crate::error::GenerateError;

#[derive(Debug, Deserialize)]
struct RawChunk {
    choices: Vec<RawChoice>,
}

#[derive(Debug, Deserialize)]
struct RawChoice {
    delta: RawDelta,
}

#[derive(Debug, Deserialize)]
struct RawDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Adapter turning an SSE byte stream into text deltas.
///
/// The buffer holds raw bytes, not text: transport chunk boundaries can
/// fall inside a multibyte UTF-8 character, so decoding happens per
/// complete line, never per network chunk.
pub struct DeltaStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    buffer: Vec<u8>,
    done: bool,
}

impl DeltaStream {
    pub fn new(
        byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            buffer: Vec::new(),
            done: false,
        }
    }
}

/// Outcome of scanning the buffer for one complete SSE data line.
enum Parsed {
    Delta(String),
    Done,
    NeedMore,
    Error(GenerateError),
}

fn take_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = buffer.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = buffer.drain(..=pos).collect();
    line.pop();
    Some(line)
}

fn parse_buffer(buffer: &mut Vec<u8>) -> Parsed {
    while let Some(line) = take_line(buffer) {
        let line = match std::str::from_utf8(&line) {
            Ok(text) => text.trim(),
            Err(e) => {
                return Parsed::Error(GenerateError::Stream(format!(
                    "invalid UTF-8 in stream: {e}"
                )));
            }
        };

        // Blank lines separate SSE events; non-data fields are ignored.
        let Some(data) = line.strip_prefix("data:") else {
            continue;
        };
        let data = data.trim();

        if data == "[DONE]" {
            return Parsed::Done;
        }

        match serde_json::from_str::<RawChunk>(data) {
            Ok(chunk) => {
                let delta = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta.content)
                    .unwrap_or_default();
                return Parsed::Delta(delta);
            }
            Err(e) => {
                let preview: String = data.chars().take(200).collect();
                return Parsed::Error(GenerateError::Stream(format!(
                    "bad stream chunk: {e} (data: {preview})"
                )));
            }
        }
    }
    Parsed::NeedMore
}

impl Stream for DeltaStream {
    type Item = Result<String, GenerateError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if this.done {
            return Poll::Ready(None);
        }

        loop {
            match parse_buffer(&mut this.buffer) {
                Parsed::Delta(text) => return Poll::Ready(Some(Ok(text))),
                Parsed::Done => {
                    this.done = true;
                    return Poll::Ready(None);
                }
                Parsed::Error(e) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Parsed::NeedMore => {}
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(GenerateError::Transport(e))));
                }
                Poll::Ready(None) => {
                    this.done = true;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn sse(lines: &[&str]) -> Vec<Result<Bytes, reqwest::Error>> {
        lines
            .iter()
            .map(|line| Ok(Bytes::from(format!("{line}\n"))))
            .collect()
    }

    #[tokio::test]
    async fn parses_deltas_in_order() {
        let mut stream = DeltaStream::new(futures::stream::iter(sse(&[
            r#"data: {"choices":[{"delta":{"content":"Hel"}}]}"#,
            "",
            r#"data: {"choices":[{"delta":{"content":"lo"}}]}"#,
            "",
            "data: [DONE]",
        ])));

        assert_eq!(stream.next().await.unwrap().unwrap(), "Hel");
        assert_eq!(stream.next().await.unwrap().unwrap(), "lo");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn handles_split_lines_across_chunks() {
        let parts: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from(r#"data: {"choices":[{"del"#)),
            Ok(Bytes::from("ta\":{\"content\":\"x\"}}]}\n")),
            Ok(Bytes::from("data: [DONE]\n")),
        ];
        let mut stream = DeltaStream::new(futures::stream::iter(parts));

        assert_eq!(stream.next().await.unwrap().unwrap(), "x");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn multibyte_character_split_across_chunks() {
        // "café" with the chunk boundary between the two bytes of 'é'.
        let mut first = br#"data: {"choices":[{"delta":{"content":"caf"#.to_vec();
        first.push(0xC3);
        let mut second = vec![0xA9];
        second.extend_from_slice(b"\"}}]}\n");

        let parts: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from(first)),
            Ok(Bytes::from(second)),
            Ok(Bytes::from("data: [DONE]\n")),
        ];
        let mut stream = DeltaStream::new(futures::stream::iter(parts));

        assert_eq!(stream.next().await.unwrap().unwrap(), "caf\u{e9}");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn invalid_utf8_in_complete_line_surfaces_stream_error() {
        let mut line = b"data: ".to_vec();
        line.push(0xFF);
        line.push(b'\n');

        let parts: Vec<Result<Bytes, reqwest::Error>> = vec![Ok(Bytes::from(line))];
        let mut stream = DeltaStream::new(futures::stream::iter(parts));

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, GenerateError::Stream(_)));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn empty_delta_is_empty_string() {
        let mut stream = DeltaStream::new(futures::stream::iter(sse(&[
            r#"data: {"choices":[{"delta":{}}]}"#,
            "data: [DONE]",
        ])));

        assert_eq!(stream.next().await.unwrap().unwrap(), "");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn malformed_json_surfaces_stream_error() {
        let mut stream =
            DeltaStream::new(futures::stream::iter(sse(&["data: {not json", "data: [DONE]"])));

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, GenerateError::Stream(_)));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn ignores_non_data_fields() {
        let mut stream = DeltaStream::new(futures::stream::iter(sse(&[
            "event: message",
            "id: 42",
            r#"data: {"choices":[{"delta":{"content":"ok"}}]}"#,
            "data: [DONE]",
        ])));

        assert_eq!(stream.next().await.unwrap().unwrap(), "ok");
        assert!(stream.next().await.is_none());
    }
}
