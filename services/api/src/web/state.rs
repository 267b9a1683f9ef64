//! services/api/src/web/state.rs
//!
//! Defines the application's shared and connection-specific states.

use crate::config::Config;
use draftsmith_core::ports::{DocumentStore, GenerationBackend, ObjectStorage, SurfaceRasterizer};
use draftsmith_core::session::GenerationSession;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Arc<Config>,
    pub generation: Arc<dyn GenerationBackend>,
    pub storage: Arc<dyn ObjectStorage>,
    pub rasterizer: Arc<dyn SurfaceRasterizer>,
}

//=========================================================================================
// ConnectionState (Specific to One WebSocket Connection)
//=========================================================================================

/// The state for a single, active WebSocket connection. The connection
/// handler is the single owner of the current session handle; "one active
/// session per connection" is enforced here, not by any module-level state.
pub struct ConnectionState {
    /// The most recently started session. Each generation task holds its
    /// own clone of this handle, so a superseded task can only ever touch
    /// the session it was started with.
    pub session: Arc<Mutex<GenerationSession>>,
    /// A token to gracefully cancel the current generation task.
    pub cancellation_token: CancellationToken,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self {
            session: Arc::new(Mutex::new(GenerationSession::new())),
            // The token is initialized here for the first generation task.
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Prepares the connection for a fresh generation: the previous task's
    /// token is cancelled (a no-op if it already finished) and replaced,
    /// and a new session takes the handle.
    pub fn begin_generation(&mut self) -> (Arc<Mutex<GenerationSession>>, CancellationToken) {
        self.cancellation_token.cancel();
        self.cancellation_token = CancellationToken::new();
        self.session = Arc::new(Mutex::new(GenerationSession::new()));
        (self.session.clone(), self.cancellation_token.clone())
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starting_a_new_generation_cancels_the_previous_token() {
        let mut state = ConnectionState::new();
        let first = state.cancellation_token.clone();
        let (_, second) = state.begin_generation();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
    }

    #[test]
    fn each_generation_gets_its_own_session_handle() {
        let mut state = ConnectionState::new();
        let (first_session, _) = state.begin_generation();
        let (second_session, _) = state.begin_generation();

        // A superseded task aborting its own session must not touch the
        // session of the generation that replaced it.
        assert!(!Arc::ptr_eq(&first_session, &second_session));
    }
}
