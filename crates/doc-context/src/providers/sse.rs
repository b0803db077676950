//! Incremental decoder for Gemini server-sent-event streams
//!
//! Chunks arrive with arbitrary boundaries: a line, a JSON object or even a
//! multi-byte character can be split across two chunks. The unterminated
//! tail of every chunk is kept as pending bytes and prefixed onto the next.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Prefix of lines carrying an event payload
pub const DATA_PREFIX: &str = "data:";

/// Longest unterminated line accepted before the stream is rejected
pub const MAX_PENDING_BYTES: usize = 8 * 1024 * 1024;

#[derive(Deserialize)]
struct StreamEvent {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<EndpointError>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct EndpointError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

impl StreamEvent {
    /// Parts of one candidate are concatenated; candidates are newline-joined
    fn text(&self) -> String {
        self.candidates
            .iter()
            .map(|candidate| {
                candidate
                    .content
                    .as_ref()
                    .map(|content| {
                        content
                            .parts
                            .iter()
                            .filter_map(|p| p.text.as_deref())
                            .collect::<String>()
                    })
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Per-call decode state
#[derive(Debug)]
pub struct OcrStreamState {
    /// Bytes after the last newline seen so far
    pending: Vec<u8>,
    max_pending: usize,
    /// Text appended in arrival order, never rewritten
    accumulated: String,
    data_lines: usize,
    parsed_events: usize,
}

impl Default for OcrStreamState {
    fn default() -> Self {
        Self::with_max_pending(MAX_PENDING_BYTES)
    }
}

impl OcrStreamState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decoder that rejects unterminated lines longer than `limit` bytes
    pub fn with_max_pending(limit: usize) -> Self {
        Self {
            pending: Vec::new(),
            max_pending: limit,
            accumulated: String::new(),
            data_lines: 0,
            parsed_events: 0,
        }
    }

    /// Feed one chunk; every complete line is processed immediately.
    ///
    /// Fails when an event reports an in-band endpoint error or when a line
    /// grows past the pending limit without a terminator.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|b| *b == b'\n') else {
            return self.check_pending();
        };

        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        for line in complete.split(|b| *b == b'\n') {
            self.process_line(line)?;
        }
        self.check_pending()
    }

    fn check_pending(&self) -> Result<()> {
        if self.pending.len() > self.max_pending {
            return Err(Error::decode(format!(
                "unterminated stream line exceeds {} bytes",
                self.max_pending
            )));
        }
        Ok(())
    }

    /// End of input: flush the pending tail and return the accumulated text
    pub fn finish(mut self) -> Result<String> {
        if !self.pending.is_empty() {
            let tail = std::mem::take(&mut self.pending);
            self.process_line(&tail)?;
        }

        if self.data_lines > 0 && self.parsed_events == 0 {
            return Err(Error::decode(format!(
                "none of {} stream events could be parsed",
                self.data_lines
            )));
        }

        Ok(self.accumulated)
    }

    /// Text accumulated so far
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    /// Bytes waiting for their line terminator
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn process_line(&mut self, raw: &[u8]) -> Result<()> {
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);

        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            // Blank separators, comments and `event:` lines
            return Ok(());
        };
        let payload = payload.strip_prefix(' ').unwrap_or(payload);
        if payload == "[DONE]" {
            return Ok(());
        }

        self.data_lines += 1;
        let event = match serde_json::from_str::<StreamEvent>(payload) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Skipping malformed stream event: {}", e);
                return Ok(());
            }
        };
        self.parsed_events += 1;

        if let Some(err) = event.error {
            return Err(Error::decode(format!(
                "endpoint reported error{}: {}",
                err.code.map(|c| format!(" {}", c)).unwrap_or_default(),
                err.message
            )));
        }

        let text = event.text();
        tracing::debug!("Stream event contributed {} bytes", text.len());
        self.accumulated.push_str(&text);
        Ok(())
    }
}
