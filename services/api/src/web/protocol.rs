//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for live document generation.

use draftsmith_core::domain::{ReasoningEffort, Verbosity};
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Requests a new document generation. Starting a generation while one
    /// is already running cancels the running one first.
    Start {
        prompt: String,
        document_type: String,
        effort: ReasoningEffort,
        verbosity: Verbosity,
    },

    /// Cancels the in-flight generation, if any.
    Cancel,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================
// NOTE: `completed`, `failed` and `aborted` are terminal; the server sends
// exactly one of them per generation.
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the generation stream has been opened.
    SessionStarted,

    /// A partial piece of reasoning text, shown while the backend thinks.
    ReasoningDelta { text: String },

    /// A partial piece of the document itself.
    ContentDelta { text: String },

    /// The generation finished and the document is persisted; the client
    /// should open it.
    Completed { document_id: String },

    /// The generation failed; the message is user-visible.
    Failed { message: String },

    /// The generation was cancelled by the client. Not a failure.
    Aborted,

    /// Reports a fatal connection-level error (e.g., a malformed request).
    Error { message: String },
}
