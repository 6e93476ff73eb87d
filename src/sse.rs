//! Server-Sent Events (SSE) processing for streamed chat completions.
//!
//! This module turns the raw byte stream of a streaming HTTP response into a
//! stream of [`ChatCompletionChunk`]s.  Events are separated by a blank line,
//! their payload lives on `data:` lines, and the stream ends with the
//! `data: [DONE]` sentinel.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::{ChatCompletionChunk, Error, Result};

const DONE_SENTINEL: &str = "[DONE]";

/// Process a stream of bytes into a stream of chat-completion chunks.
///
/// Payloads split across reads are reassembled, CRLF line endings are
/// accepted, comment lines and events without data are skipped.  A malformed
/// event yields an error item and decoding continues with the next event; a
/// transport error yields an error item and ends the stream.
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin + Send + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let buffer: Vec<u8> = Vec::new();

    stream::unfold(
        (byte_stream, buffer, false),
        move |(mut stream, mut buffer, mut finished)| async move {
            loop {
                if finished {
                    return None;
                }

                // First check if we have a complete event in the buffer
                if let Some(event) = take_event(&mut buffer) {
                    match parse_event(&event) {
                        SseEvent::Skip => continue,
                        SseEvent::Done => return None,
                        SseEvent::Chunk(chunk) => {
                            return Some((chunk, (stream, buffer, finished)));
                        }
                    }
                }

                // Read more data
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));
                    }
                    Some(Err(e)) => {
                        finished = true;
                        let err = Error::streaming(
                            format!("Error in HTTP stream: {e}"),
                            Some(Box::new(e)),
                        );
                        return Some((Err(err), (stream, buffer, finished)));
                    }
                    None => {
                        // End of stream; a final event may lack its blank line
                        finished = true;
                        if buffer.iter().all(u8::is_ascii_whitespace) {
                            return None;
                        }
                        let event = std::mem::take(&mut buffer);
                        return match parse_event(&event) {
                            SseEvent::Chunk(chunk) => Some((chunk, (stream, buffer, finished))),
                            SseEvent::Skip | SseEvent::Done => None,
                        };
                    }
                }
            }
        },
    )
}

enum SseEvent {
    Skip,
    Done,
    Chunk(Result<ChatCompletionChunk>),
}

/// Remove the first complete event from the buffer, without its terminator.
fn take_event(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = buffer.windows(2).position(|w| w == b"\n\n")?;
    let mut event: Vec<u8> = buffer.drain(..pos + 2).collect();
    event.truncate(pos);
    Some(event)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Error { error: ErrorDetail },
    Chunk(ChatCompletionChunk),
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: Option<String>,
}

fn parse_event(event: &[u8]) -> SseEvent {
    let text = match std::str::from_utf8(event) {
        Ok(text) => text,
        Err(e) => {
            return SseEvent::Chunk(Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {e}"),
                Some(Box::new(e)),
            )));
        }
    };

    let data = text
        .lines()
        .filter(|line| !line.starts_with(':'))
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect::<Vec<_>>();
    if data.is_empty() {
        return SseEvent::Skip;
    }
    let data = data.join("\n");
    if data.trim() == DONE_SENTINEL {
        return SseEvent::Done;
    }

    match serde_json::from_str::<Payload>(&data) {
        Ok(Payload::Chunk(chunk)) => SseEvent::Chunk(Ok(chunk)),
        Ok(Payload::Error { error }) => SseEvent::Chunk(Err(Error::api(
            500,
            Some(error.error_type.unwrap_or_else(|| "stream_error".to_string())),
            error.message.unwrap_or(data),
            None,
        ))),
        Err(e) => SseEvent::Chunk(Err(Error::serialization(
            format!("Failed to parse event JSON: {e}"),
            Some(Box::new(e)),
        ))),
    }
}
