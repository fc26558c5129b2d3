//! Server-Sent Events framing.
//!
//! Splits an HTTP body byte stream on blank lines and yields the joined
//! `data:` payload of each event. Comment lines (`: keep-alive`) and other
//! fields are skipped. Bytes are buffered until an event is complete, so a
//! multi-byte character split across network chunks decodes correctly.

use super::error::OpenAiError;
use futures::stream::{self, Stream, StreamExt};
use std::fmt::Display;

/// Terminator sent by OpenAI-compatible servers after the last chunk.
pub const DONE_MARKER: &str = "[DONE]";

/// One decoded SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Payload of the event's `data:` lines, joined with `\n`.
    Data(String),
    /// `data: [DONE]`
    Done,
}

/// Byte buffer that hands out complete events.
#[derive(Debug, Default)]
struct EventBuffer {
    bytes: Vec<u8>,
}

impl EventBuffer {
    fn push(&mut self, chunk: &[u8]) {
        // Normalise CRLF framing; JSON payloads never carry raw CRs.
        self.bytes.extend(chunk.iter().copied().filter(|b| *b != b'\r'));
    }

    /// Take the next complete event (without its blank-line terminator).
    fn next_event(&mut self) -> Option<Vec<u8>> {
        let end = self.bytes.windows(2).position(|w| w == b"\n\n")?;
        let event = self.bytes[..end].to_vec();
        self.bytes.drain(..end + 2);
        Some(event)
    }

    /// Whatever is left once the body ends.
    fn take_rest(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.bytes);
        if rest.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(rest)
        }
    }
}

/// Extract the frame from one raw event; `None` for comment-only events.
pub fn parse_event(event: &str) -> Option<SseFrame> {
    let mut data: Option<String> = None;
    for line in event.lines() {
        let Some(value) = line.strip_prefix("data:") else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        match data.as_mut() {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(value);
            }
            None => data = Some(value.to_string()),
        }
    }

    data.map(|payload| {
        if payload.trim() == DONE_MARKER {
            SseFrame::Done
        } else {
            SseFrame::Data(payload)
        }
    })
}

fn decode(event: Vec<u8>) -> Option<Result<SseFrame, OpenAiError>> {
    match String::from_utf8(event) {
        Ok(text) => parse_event(&text).map(Ok),
        Err(e) => Some(Err(OpenAiError::Encoding(e))),
    }
}

/// Turn a body byte stream into SSE frames.
///
/// A transport error is yielded once and ends the frame stream.
pub fn frames<S, B, E>(body: S) -> impl Stream<Item = Result<SseFrame, OpenAiError>>
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: Display,
{
    let body = Box::pin(body);
    stream::unfold(
        (body, EventBuffer::default(), false),
        |(mut body, mut buffer, mut done)| async move {
            loop {
                if done {
                    return None;
                }

                if let Some(event) = buffer.next_event() {
                    match decode(event) {
                        Some(frame) => return Some((frame, (body, buffer, done))),
                        None => continue,
                    }
                }

                match body.next().await {
                    Some(Ok(chunk)) => buffer.push(chunk.as_ref()),
                    Some(Err(e)) => {
                        done = true;
                        let err = OpenAiError::Stream(e.to_string());
                        return Some((Err(err), (body, buffer, done)));
                    }
                    None => {
                        done = true;
                        if let Some(frame) = buffer.take_rest().and_then(decode) {
                            return Some((frame, (body, buffer, done)));
                        }
                        return None;
                    }
                }
            }
        },
    )
}
