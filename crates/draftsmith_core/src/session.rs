//! crates/draftsmith_core/src/session.rs
//!
//! The generation session state machine.
//!
//! A session folds the decoded stream events of exactly one generation
//! request. It is single-owner: the connection that started the request
//! holds the handle, and all mutation goes through `apply`, `fail` and
//! `abort`. Once a terminal phase is reached the session ignores everything
//! else, so the three terminal states stay mutually exclusive.

use crate::domain::{Phase, StreamEvent};

/// Mutable state accumulated while folding one generation stream.
#[derive(Debug, Clone)]
pub struct GenerationSession {
    pub reasoning_text: String,
    pub content_text: String,
    pub phase: Phase,
    pub character_count: usize,
    /// Set when a successful terminal frame carried a persisted document id.
    pub document_id: Option<String>,
    /// Human-readable reason, set only in the `Failed` phase.
    pub failure: Option<String>,
}

impl Default for GenerationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GenerationSession {
    pub fn new() -> Self {
        Self {
            reasoning_text: String::new(),
            content_text: String::new(),
            phase: Phase::Reasoning,
            character_count: 0,
            document_id: None,
            failure: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Folds one stream event, in arrival order. Events after a terminal
    /// phase are dropped.
    pub fn apply(&mut self, event: StreamEvent) {
        if self.is_terminal() {
            return;
        }

        match event {
            StreamEvent::Reasoning(delta) => {
                // Writing supersedes reasoning for good; late reasoning
                // deltas are dropped rather than un-gating the phase.
                if self.phase == Phase::Reasoning {
                    self.reasoning_text.push_str(&delta);
                    self.character_count = self.reasoning_text.chars().count();
                }
            }
            StreamEvent::Content(delta) => {
                // The first non-empty content delta is a one-way gate.
                if self.phase == Phase::Reasoning && !delta.is_empty() {
                    self.phase = Phase::Writing;
                }
                if self.phase == Phase::Writing {
                    self.content_text.push_str(&delta);
                    self.character_count = self.content_text.chars().count();
                }
            }
            StreamEvent::Done {
                document_id,
                error: Some(error),
            } => {
                self.phase = Phase::Failed;
                self.failure = Some(error);
                self.document_id = document_id;
            }
            StreamEvent::Done {
                document_id,
                error: None,
            } => {
                self.phase = Phase::Complete;
                self.document_id = document_id;
            }
        }
    }

    /// Records a transport failure. Reported once; a session already in a
    /// terminal phase is left untouched.
    pub fn fail(&mut self, reason: impl Into<String>) {
        if self.is_terminal() {
            return;
        }
        self.phase = Phase::Failed;
        self.failure = Some(reason.into());
    }

    /// Caller-initiated cancellation. Partial text is discarded: nothing
    /// accumulated by an aborted session may be persisted. Aborting a
    /// finished session is a no-op, matching the cancellation token's
    /// cancel-after-completion semantics.
    pub fn abort(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.phase = Phase::Aborted;
        self.reasoning_text.clear();
        self.content_text.clear();
        self.character_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done_ok(document_id: Option<&str>) -> StreamEvent {
        StreamEvent::Done {
            document_id: document_id.map(String::from),
            error: None,
        }
    }

    fn done_err(error: &str) -> StreamEvent {
        StreamEvent::Done {
            document_id: None,
            error: Some(error.to_string()),
        }
    }

    #[test]
    fn reasoning_then_content_then_done_completes() {
        // Scenario: reasoning deltas, one content delta, successful Done.
        let mut session = GenerationSession::new();
        session.apply(StreamEvent::Reasoning("Anal".into()));
        session.apply(StreamEvent::Reasoning("yzing...".into()));
        session.apply(StreamEvent::Content("# Title".into()));
        session.apply(done_ok(Some("42")));

        assert_eq!(session.phase, Phase::Complete);
        assert_eq!(session.reasoning_text, "Analyzing...");
        assert_eq!(session.content_text, "# Title");
        assert_eq!(session.document_id.as_deref(), Some("42"));
    }

    #[test]
    fn reasoning_concatenates_in_arrival_order() {
        let mut session = GenerationSession::new();
        for delta in ["a", "b", "c"] {
            session.apply(StreamEvent::Reasoning(delta.into()));
        }
        assert_eq!(session.reasoning_text, "abc");
        assert_eq!(session.character_count, 3);
        assert_eq!(session.phase, Phase::Reasoning);
    }

    #[test]
    fn first_content_delta_is_a_one_way_gate() {
        let mut session = GenerationSession::new();
        session.apply(StreamEvent::Reasoning("still thinking".into()));
        session.apply(StreamEvent::Content("body".into()));
        assert_eq!(session.phase, Phase::Writing);

        // A late reasoning delta must not revert the phase or the counter.
        session.apply(StreamEvent::Reasoning("ignored".into()));
        assert_eq!(session.phase, Phase::Writing);
        assert_eq!(session.character_count, "body".chars().count());
        assert_eq!(session.reasoning_text, "still thinking");
    }

    #[test]
    fn character_count_tracks_the_writing_text() {
        let mut session = GenerationSession::new();
        session.apply(StreamEvent::Content("héllo".into()));
        assert_eq!(session.character_count, 5);
        session.apply(StreamEvent::Content(" wörld".into()));
        assert_eq!(session.character_count, 11);
    }

    #[test]
    fn done_with_error_fails_the_session() {
        // Scenario: content then a failing Done.
        let mut session = GenerationSession::new();
        session.apply(StreamEvent::Content("draft".into()));
        session.apply(done_err("rate limited"));

        assert_eq!(session.phase, Phase::Failed);
        assert_eq!(session.failure.as_deref(), Some("rate limited"));
    }

    #[test]
    fn events_after_a_terminal_phase_are_dropped() {
        let mut session = GenerationSession::new();
        session.apply(done_err("boom"));
        session.apply(StreamEvent::Content("late".into()));
        session.apply(done_ok(Some("7")));

        assert_eq!(session.phase, Phase::Failed);
        assert!(session.content_text.is_empty());
        assert_eq!(session.document_id, None);
    }

    #[test]
    fn abort_before_content_discards_partials() {
        // Scenario: cancel after reasoning only; nothing may be persisted.
        let mut session = GenerationSession::new();
        session.apply(StreamEvent::Reasoning("x".into()));
        session.abort();

        assert_eq!(session.phase, Phase::Aborted);
        assert!(session.reasoning_text.is_empty());
        assert!(session.content_text.is_empty());
        assert_eq!(session.character_count, 0);
    }

    #[test]
    fn abort_is_idempotent_and_a_noop_after_completion() {
        let mut session = GenerationSession::new();
        session.apply(StreamEvent::Content("body".into()));
        session.abort();
        session.abort();
        assert_eq!(session.phase, Phase::Aborted);

        let mut finished = GenerationSession::new();
        finished.apply(done_ok(None));
        finished.abort();
        assert_eq!(finished.phase, Phase::Complete);
    }

    #[test]
    fn transport_failure_is_reported_once() {
        let mut session = GenerationSession::new();
        session.fail("connection dropped");
        session.fail("second report");
        assert_eq!(session.phase, Phase::Failed);
        assert_eq!(session.failure.as_deref(), Some("connection dropped"));
    }
}
