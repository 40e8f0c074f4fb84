//! Server-sent event decoding for streamed chat completions.

use std::io::BufRead;

use bytes::Bytes;

use super::response::ChatCompletionChunk;
use crate::core::LlmError;

const DONE_MARKER: &str = "[DONE]";

/// Turns `data:` lines into chunks. Everything after `[DONE]` is ignored.
#[derive(Debug, Default)]
pub(crate) struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    /// Feed raw bytes; returns the chunks completed by them.
    pub fn feed(&mut self, bytes: &Bytes) -> Vec<Result<ChatCompletionChunk, LlmError>> {
        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(chunk) = self.line(&line) {
                chunks.push(chunk);
            }
        }
        chunks
    }

    /// Decode whatever is left once the body ends without a trailing newline.
    pub fn finish(&mut self) -> Option<Result<ChatCompletionChunk, LlmError>> {
        if self.buffer.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buffer);
        self.line(&String::from_utf8_lossy(&rest))
    }

    /// Decode a single line. Comments, blank lines and non-data fields yield nothing.
    pub fn line(&mut self, line: &str) -> Option<Result<ChatCompletionChunk, LlmError>> {
        if self.done {
            return None;
        }

        let data = line
            .trim_end_matches(['\r', '\n'])
            .strip_prefix("data:")?
            .trim_start();

        if data == DONE_MARKER {
            self.done = true;
            return None;
        }
        if data.is_empty() {
            return None;
        }

        Some(serde_json::from_str(data).map_err(|e| LlmError::Parse {
            message: format!("Failed to parse stream event: {data}"),
            source: Box::new(e),
        }))
    }
}

/// Blocking chunk iterator over a response body. Stops after the first read error.
pub(crate) struct SseLines<R> {
    lines: std::io::Lines<R>,
    decoder: SseDecoder,
    failed: bool,
}

impl<R: BufRead> SseLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            decoder: SseDecoder::default(),
            failed: false,
        }
    }
}

impl<R: BufRead> Iterator for SseLines<R> {
    type Item = Result<ChatCompletionChunk, LlmError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            match self.lines.next()? {
                Ok(line) => {
                    if let Some(chunk) = self.decoder.line(&line) {
                        return Some(chunk);
                    }
                    if self.decoder.done {
                        return None;
                    }
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(LlmError::Network {
                        message: "Failed to read stream".to_string(),
                        source: Box::new(e),
                    }));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: &str = concat!(
        ": keep-alive\n",
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"Hel\"}}]}\n",
        "\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}\r\n",
        "\n",
        "data: [DONE]\n",
        "data: {\"choices\":[{\"delta\":{\"content\":\"ignored\"}}]}\n",
    );

    #[test]
    fn test_decoder_handles_split_input() {
        let mut decoder = SseDecoder::default();
        let bytes = EVENTS.as_bytes();
        let (head, tail) = bytes.split_at(40);

        let mut chunks = decoder.feed(&Bytes::copy_from_slice(head));
        chunks.extend(decoder.feed(&Bytes::copy_from_slice(tail)));

        let texts: Vec<String> = chunks
            .into_iter()
            .map(|c| c.unwrap().delta_text().to_string())
            .collect();
        assert_eq!(texts, vec!["Hel", "lo"]);
    }

    #[test]
    fn test_blocking_lines_stop_at_done() {
        let texts: Vec<String> = SseLines::new(EVENTS.as_bytes())
            .map(|c| c.unwrap().delta_text().to_string())
            .collect();
        assert_eq!(texts, vec!["Hel", "lo"]);
    }

    #[test]
    fn test_unterminated_last_event_matches_blocking_lines() {
        let body = concat!(
            "data: {\"choices\":[{\"delta\":{\"content\":\"Hel\"}}]}\n",
            "data: {\"choices\":[{\"delta\":{\"content\":\"lo\"}}]}",
        );

        let mut decoder = SseDecoder::default();
        let mut chunks = decoder.feed(&Bytes::from_static(body.as_bytes()));
        chunks.extend(decoder.finish());
        assert!(decoder.finish().is_none());

        let streamed: Vec<String> = chunks
            .into_iter()
            .map(|c| c.unwrap().delta_text().to_string())
            .collect();
        let blocking: Vec<String> = SseLines::new(body.as_bytes())
            .map(|c| c.unwrap().delta_text().to_string())
            .collect();

        assert_eq!(streamed, vec!["Hel", "lo"]);
        assert_eq!(streamed, blocking);
    }

    #[test]
    fn test_malformed_event_is_parse_error() {
        let mut decoder = SseDecoder::default();
        let result = decoder.line("data: {not json").unwrap();
        assert!(matches!(result, Err(LlmError::Parse { .. })));
    }
}
