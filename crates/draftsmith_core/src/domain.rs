//! crates/draftsmith_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization target
//! beyond the serde derives needed for the wire and the document store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How much internal reasoning the generation backend spends on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Minimal,
    Low,
    Medium,
    High,
}

/// How verbose the generated document should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Low,
    Medium,
    High,
}

/// An immutable request handed to the generation backend. Created by the
/// caller; never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub document_type: String,
    pub effort: ReasoningEffort,
    pub verbosity: Verbosity,
}

/// One decoded unit of the generation stream.
///
/// Contract:
/// - `Reasoning` and `Content` deltas arrive in order and are folded exactly
///   once each.
/// - The stream terminates with at most one `Done`; after it, no further
///   events are meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Partial reasoning text produced before the document itself.
    Reasoning(String),
    /// Partial document text.
    Content(String),
    /// Terminal frame. `error` is present only on failure; `document_id`
    /// only when the backend persisted the finished document itself.
    Done {
        document_id: Option<String>,
        error: Option<String>,
    },
}

impl StreamEvent {
    /// Returns true if this event terminates the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}

/// The stage a generation session is currently in.
///
/// `Complete`, `Failed` and `Aborted` are terminal: no further mutation
/// occurs after reaching one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reasoning,
    Writing,
    Complete,
    Aborted,
    Failed,
}

impl Phase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Aborted | Self::Failed)
    }
}

/// Horizontal alignment of document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    Left,
    Center,
    Right,
    Justify,
}

/// Document-wide style attributes chosen by the author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStyling {
    pub font_size: u16,
    pub font_family: String,
    pub text_color: String,
    pub background_color: String,
    pub alignment: TextAlignment,
}

impl Default for DocumentStyling {
    fn default() -> Self {
        Self {
            font_size: 16,
            font_family: "Georgia".to_string(),
            text_color: "#1a1a1a".to_string(),
            background_color: "#ffffff".to_string(),
            alignment: TextAlignment::Left,
        }
    }
}

/// A persisted document. The body is the rich-text serialized form (a JSON
/// surface-node tree); export reads it but never mutates it.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: Uuid,
    pub title: String,
    pub body: serde_json::Value,
    pub styling: DocumentStyling,
    pub is_public: bool,
    pub access_secret: Option<String>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A partial update applied to a stored document. `None` fields are left
/// unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentPatch {
    pub title: Option<String>,
    pub body: Option<serde_json::Value>,
    pub styling: Option<DocumentStyling>,
    pub is_public: Option<bool>,
    pub access_secret: Option<String>,
}

impl DocumentPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.body.is_none()
            && self.styling.is_none()
            && self.is_public.is_none()
            && self.access_secret.is_none()
    }
}

/// Derives a document title from generated content: the first markdown
/// heading if one exists, otherwise the first non-empty line.
pub fn title_from_content(content: &str) -> String {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let title = trimmed.trim_start_matches('#').trim();
        if title.is_empty() {
            continue;
        }
        return title.chars().take(120).collect();
    }
    "Untitled document".to_string()
}
