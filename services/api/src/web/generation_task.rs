//! services/api/src/web/generation_task.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! one document generation: it folds the backend's event stream into the
//! connection's session, forwards deltas to the client, persists the
//! finished document, and sends exactly one terminal message.

use crate::web::{protocol::ServerMessage, state::AppState};
use axum::extract::ws::{Message, WebSocket};
use draftsmith_core::{
    domain::{title_from_content, GenerationRequest, Phase, StreamEvent},
    ports::{PortError, PortResult},
    session::GenerationSession,
    surface::SurfaceNode,
};
use futures::{stream::SplitSink, SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long the terminal UI state stays visible before the client is told
/// to navigate to the finished document. A UX pause, not a correctness
/// requirement.
pub const NAVIGATION_GRACE: Duration = Duration::from_millis(1200);

/// How the folding loop ended.
enum StreamOutcome {
    /// The caller cancelled; the session was aborted.
    Cancelled,
    /// A terminal frame was folded into the session.
    TerminalFolded,
    /// The transport failed mid-stream.
    TransportFailed,
    /// The stream ended without a terminal frame.
    EndedEarly,
}

/// The main asynchronous task for one generation request.
///
/// This is a long-running task that consumes the backend stream event by
/// event. It is designed to be gracefully cancelled via a
/// `CancellationToken`: on cancellation the stream is dropped (closing the
/// underlying connection), the session is aborted, and nothing is persisted.
pub async fn generation_process(
    app_state: Arc<AppState>,
    session_lock: Arc<Mutex<GenerationSession>>,
    ws_sender: Arc<Mutex<SplitSink<WebSocket, Message>>>,
    request: GenerationRequest,
    cancellation_token: CancellationToken,
) -> PortResult<()> {
    info!("Generation process started.");

    let mut events = match app_state.generation.start_generation(&request).await {
        Ok(events) => events,
        Err(e) => {
            warn!("Failed to open generation stream: {:?}", e);
            let message = "Could not reach the generation service.".to_string();
            session_lock.lock().await.fail(message.clone());
            send_message(&ws_sender, &ServerMessage::Failed { message }).await;
            return Ok(());
        }
    };

    send_message(&ws_sender, &ServerMessage::SessionStarted).await;

    let outcome = loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                break StreamOutcome::Cancelled;
            }
            item = events.next() => {
                match item {
                    Some(Ok(event)) => {
                        let terminal = event.is_terminal();
                        let delta = delta_message(&event);
                        session_lock.lock().await.apply(event);
                        if let Some(message) = delta {
                            send_message(&ws_sender, &message).await;
                        }
                        if terminal {
                            break StreamOutcome::TerminalFolded;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("Generation transport failed: {:?}", e);
                        break StreamOutcome::TransportFailed;
                    }
                    None => {
                        warn!("Generation stream ended without a terminal frame.");
                        break StreamOutcome::EndedEarly;
                    }
                }
            }
        }
    };

    // The stream's job is over on every path; dropping it releases the
    // backend connection synchronously.
    drop(events);

    match outcome {
        StreamOutcome::Cancelled => {
            info!("Generation process cancelled.");
            session_lock.lock().await.abort();
            send_message(&ws_sender, &ServerMessage::Aborted).await;
            return Ok(());
        }
        StreamOutcome::TransportFailed | StreamOutcome::EndedEarly => {
            let message = "The generation stream was interrupted.".to_string();
            session_lock.lock().await.fail(message.clone());
            send_message(&ws_sender, &ServerMessage::Failed { message }).await;
            return Ok(());
        }
        StreamOutcome::TerminalFolded => {}
    }

    // The terminal frame has been folded; read the outcome.
    let (phase, failure, document_id, content_text) = {
        let session = session_lock.lock().await;
        (
            session.phase,
            session.failure.clone(),
            session.document_id.clone(),
            session.content_text.clone(),
        )
    };

    match phase {
        Phase::Failed => {
            // Backend-reported failure; the reason is surfaced verbatim and
            // the partial content is never persisted.
            let message = failure.unwrap_or_else(|| "Generation failed.".to_string());
            send_message(&ws_sender, &ServerMessage::Failed { message }).await;
        }
        Phase::Complete => {
            let document_id = match document_id {
                Some(id) => id,
                None => {
                    // The backend did not persist; the document is created
                    // here from the accumulated content.
                    let title = title_from_content(&content_text);
                    let body = serde_json::to_value(SurfaceNode {
                        text: Some(content_text),
                        ..Default::default()
                    })
                    .map_err(|e| PortError::Unexpected(e.to_string()))?;
                    match app_state
                        .store
                        .create_document(&title, &body, &Default::default())
                        .await
                    {
                        Ok(document) => document.id.to_string(),
                        Err(e) => {
                            warn!("Failed to persist the generated document: {:?}", e);
                            send_message(
                                &ws_sender,
                                &ServerMessage::Failed {
                                    message: "The document could not be saved.".to_string(),
                                },
                            )
                            .await;
                            return Ok(());
                        }
                    }
                }
            };

            info!("Generation complete; document {} ready.", document_id);
            // Let the finished state stay on screen briefly before the
            // client navigates away.
            tokio::time::sleep(NAVIGATION_GRACE).await;
            send_message(&ws_sender, &ServerMessage::Completed { document_id }).await;
        }
        other => {
            // Aborted is handled in the cancellation arm; any other phase
            // here means the stream broke its own contract.
            warn!("Generation ended in unexpected phase {:?}.", other);
            send_message(
                &ws_sender,
                &ServerMessage::Failed {
                    message: "The generation ended unexpectedly.".to_string(),
                },
            )
            .await;
        }
    }

    Ok(())
}

/// The live delta to forward for an event, if any.
fn delta_message(event: &StreamEvent) -> Option<ServerMessage> {
    match event {
        StreamEvent::Reasoning(text) => Some(ServerMessage::ReasoningDelta {
            text: text.clone(),
        }),
        StreamEvent::Content(text) => Some(ServerMessage::ContentDelta { text: text.clone() }),
        StreamEvent::Done { .. } => None,
    }
}

async fn send_message(
    ws_sender: &Arc<Mutex<SplitSink<WebSocket, Message>>>,
    message: &ServerMessage,
) {
    let json = serde_json::to_string(message).unwrap();
    if ws_sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_err()
    {
        warn!(
            "Failed to send {:?} message. Client may have disconnected.",
            message
        );
    }
}
