//! crates/draftsmith_core/src/stream.rs
//!
//! The frame decoder for the generation stream protocol.
//!
//! The transport is a sequence of newline-delimited frames. A frame of
//! interest begins with the `data: ` marker followed by a small JSON record;
//! every other line is discarded without error. The protocol is best-effort
//! and forward-only: an unparsable frame is skipped, never raised.

use crate::domain::StreamEvent;
use bytes::BytesMut;
use serde::Deserialize;

/// The marker a recognized frame must begin with.
pub const EVENT_PREFIX: &str = "data: ";

/// The JSON payload of one recognized frame. Unknown fields are ignored.
#[derive(Debug, Default, Deserialize)]
struct FramePayload {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    done: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    document: Option<FrameDocument>,
}

#[derive(Debug, Default, Deserialize)]
struct FrameDocument {
    #[serde(default)]
    id: Option<String>,
}

/// Incremental line decoder for the generation stream.
///
/// Network chunks do not align with frame boundaries, so the decoder buffers
/// the partial trailing line (at the byte level, which also keeps a UTF-8
/// sequence split across chunks intact) and emits events only for complete
/// lines. `finish` flushes a final unterminated line.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one network chunk and returns the events decoded from every
    /// line it completed, in arrival order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamEvent> {
        self.buf.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line = self.buf.split_to(pos + 1);
            decode_line(&line[..pos], &mut events);
        }
        events
    }

    /// Consumes the decoder, flushing a trailing frame that arrived without
    /// a final newline.
    pub fn finish(self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        if !self.buf.is_empty() {
            decode_line(&self.buf, &mut events);
        }
        events
    }
}

/// Decodes one complete line. A single frame can carry reasoning, content
/// and the terminal flag together; the resulting events preserve that order
/// so the terminal event is always folded last.
fn decode_line(line: &[u8], events: &mut Vec<StreamEvent>) {
    let Ok(text) = std::str::from_utf8(line) else {
        return;
    };
    let Some(payload_json) = text.trim_end_matches('\r').strip_prefix(EVENT_PREFIX) else {
        return;
    };
    let Ok(payload) = serde_json::from_str::<FramePayload>(payload_json) else {
        return;
    };

    if let Some(reasoning) = payload.reasoning.filter(|r| !r.is_empty()) {
        events.push(StreamEvent::Reasoning(reasoning));
    }
    if let Some(content) = payload.content.filter(|c| !c.is_empty()) {
        events.push(StreamEvent::Content(content));
    }
    if payload.done == Some(true) {
        events.push(StreamEvent::Done {
            document_id: payload.document.and_then(|d| d.id),
            error: payload.error,
        });
    }
}
