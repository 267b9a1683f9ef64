//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! It owns the connection's session handle and delegates each generation to
//! the worker task.

use crate::web::{
    generation_task::generation_process,
    protocol::{ClientMessage, ServerMessage},
    state::{AppState, ConnectionState},
};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use draftsmith_core::domain::GenerationRequest;
use futures::{
    stream::{SplitSink, StreamExt},
    SinkExt,
};
use std::sync::Arc;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{error, info, warn};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    // The sender is wrapped in an Arc<Mutex<>> to allow for shared mutable access across tasks.
    let (sender, mut receiver) = socket.split();
    let ws_sender = Arc::new(Mutex::new(sender));

    let connection_state_lock = Arc::new(Mutex::new(ConnectionState::new()));
    let mut generation_task_handle: Option<JoinHandle<()>> = None;

    loop {
        if let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    handle_text_message(
                        text.to_string(),
                        &app_state,
                        &connection_state_lock,
                        &ws_sender,
                        &mut generation_task_handle,
                    )
                    .await;
                }
                Message::Close(_) => {
                    info!("Client sent close message.");
                    break;
                }
                _ => {}
            }
        } else {
            info!("Client disconnected.");
            break;
        }
    }

    // --- Cleanup ---
    // The token stops the worker's folding; aborting the handle releases it
    // even if it is parked on a slow backend read.
    connection_state_lock.lock().await.cancellation_token.cancel();
    if let Some(handle) = generation_task_handle {
        handle.abort();
    }
    info!("WebSocket connection closed.");
}

/// Helper function to handle the logic for different `ClientMessage` variants.
async fn handle_text_message(
    text: String,
    app_state: &Arc<AppState>,
    connection_state_lock: &Arc<Mutex<ConnectionState>>,
    ws_sender: &Arc<Mutex<SplitSink<WebSocket, Message>>>,
    generation_task_handle: &mut Option<JoinHandle<()>>,
) {
    match serde_json::from_str::<ClientMessage>(&text) {
        Ok(client_msg) => match client_msg {
            ClientMessage::Start {
                prompt,
                document_type,
                effort,
                verbosity,
            } => {
                // Boundary validation: an empty prompt is rejected before
                // any session starts.
                if prompt.trim().is_empty() {
                    let err_msg = ServerMessage::Error {
                        message: "Prompt must not be empty.".to_string(),
                    };
                    let err_json = serde_json::to_string(&err_msg).unwrap();
                    let _ = ws_sender.lock().await.send(Message::Text(err_json.into())).await;
                    return;
                }

                info!("Start message received. Beginning a new generation.");
                let request = GenerationRequest {
                    prompt,
                    document_type,
                    effort,
                    verbosity,
                };

                // Starting a new generation implicitly cancels the previous
                // one; a fresh token and session take over the handle.
                let (session_lock, token) =
                    connection_state_lock.lock().await.begin_generation();

                let task = {
                    let app_state = app_state.clone();
                    let ws_sender = ws_sender.clone();
                    tokio::spawn(async move {
                        if let Err(e) = generation_process(
                            app_state,
                            session_lock,
                            ws_sender,
                            request,
                            token,
                        )
                        .await
                        {
                            error!("Generation process failed: {:?}", e);
                        }
                    })
                };
                *generation_task_handle = Some(task);
            }
            ClientMessage::Cancel => {
                info!("Cancel message received. Cancelling generation task.");
                // Cancelling twice, or with nothing running, is a no-op.
                connection_state_lock.lock().await.cancellation_token.cancel();
            }
        },
        Err(e) => {
            warn!("Failed to deserialize client message: {}", e);
        }
    }
}
