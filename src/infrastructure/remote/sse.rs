//! Server-sent event decoding
//!
//! [`SseDecoder`] turns arbitrary byte chunks into dispatched events: lines
//! may be split across chunks and end in LF or CRLF, `data` fields of one
//! event are joined with newlines, comment lines are skipped, and `id` and
//! `retry` fields are ignored.

use futures_util::StreamExt;
use tracing::{trace, warn};

use crate::application::dto::stream_event::MESSAGE_EVENT;
use crate::application::dto::RawEvent;
use crate::application::ports::outbound::{EventStream, RemoteError};

#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the events completed by it
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RawEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(end) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line).into_owned();
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush at end of stream; a final event without a trailing blank line still counts
    pub fn finish(&mut self) -> Option<RawEvent> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let line = String::from_utf8_lossy(&rest);
            let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
            if let Some(event) = self.process_line(&line) {
                return Some(event);
            }
        }
        self.dispatch()
    }

    fn process_line(&mut self, line: &str) -> Option<RawEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<RawEvent> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        let event = event
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| MESSAGE_EVENT.to_string());
        Some(RawEvent::new(event, data))
    }
}

/// Adapt an SSE response body into a stream of typed events
///
/// Events the decoder does not know are skipped, as are events whose JSON
/// does not parse. A failing body ends the stream with a `Stream` error.
pub fn event_stream<T, D>(response: reqwest::Response, decode: D) -> EventStream<T>
where
    T: Send + 'static,
    D: Fn(&RawEvent) -> Result<Option<T>, RemoteError> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(RemoteError::Stream(e.to_string()));
                    return;
                }
            };
            for raw in decoder.push(&chunk) {
                match decode(&raw) {
                    Ok(Some(event)) => yield Ok(event),
                    Ok(None) => trace!(event = %raw.event, "Skipping unknown event"),
                    Err(e) => warn!(event = %raw.event, error = %e, "Skipping malformed event"),
                }
            }
        }

        if let Some(raw) = decoder.finish() {
            match decode(&raw) {
                Ok(Some(event)) => yield Ok(event),
                Ok(None) => trace!(event = %raw.event, "Skipping unknown event"),
                Err(e) => warn!(event = %raw.event, error = %e, "Skipping malformed event"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_event_with_crlf() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b"event: delta\r\ndata: {\"text\":\"a\"}\r\n\r\n");
        assert_eq!(events, vec![RawEvent::new("delta", r#"{"text":"a"}"#)]);
    }

    #[test]
    fn test_lines_split_across_chunks() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: com").is_empty());
        assert!(decoder.push(b"plete\ndata: {\"to").is_empty());
        let events = decoder.push(b"tal\": 10}\n\n");
        assert_eq!(events, vec![RawEvent::new("complete", r#"{"total": 10}"#)]);
    }

    #[test]
    fn test_multibyte_character_split_across_chunks() {
        let text = "data: 비\n\n".as_bytes();
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(&text[..7]).is_empty());
        let events = decoder.push(&text[7..]);
        assert_eq!(events, vec![RawEvent::new(MESSAGE_EVENT, "비")]);
    }

    #[test]
    fn test_multi_line_data_and_comments() {
        let mut decoder = SseDecoder::new();
        let events = decoder.push(b": keep-alive\nid: 7\nretry: 1000\ndata: first\ndata: second\n\n");
        assert_eq!(events, vec![RawEvent::new(MESSAGE_EVENT, "first\nsecond")]);
    }

    #[test]
    fn test_event_without_data_is_not_dispatched() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: ping\n\n").is_empty());
        // The dangling name does not leak into the next event
        let events = decoder.push(b"data: {}\n\n");
        assert_eq!(events, vec![RawEvent::new(MESSAGE_EVENT, "{}")]);
    }

    #[test]
    fn test_finish_flushes_unterminated_event() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"event: done\ndata: {}").is_empty());
        assert_eq!(decoder.finish(), Some(RawEvent::new("done", "{}")));
        assert_eq!(decoder.finish(), None);
    }
}
