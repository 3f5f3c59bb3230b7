//! WebSocket handler for replica synchronization.
//!
//! Each connection gets the full project list once, then a live feed of hub
//! messages in publish order. Inbound traffic is limited to pings; anything
//! unparsable is answered with an in-band `error` message and the connection
//! stays open.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures::{stream::SplitSink, SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::api::AppState;
use crate::error::NetsimError;

use super::message::{ClientMessage, ServerMessage};

/// Handle WebSocket upgrade.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drive one subscriber connection until it closes or errors out.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();

    // Subscribe before snapshotting so mutations racing with the snapshot
    // are queued rather than lost.
    let mut updates = state.hub.subscribe();

    let initial = ServerMessage::ProjectsInitial {
        projects: state.store.list().await,
    };
    if send_message(&mut sink, &initial).await.is_err() {
        return;
    }

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Ok(message) => {
                    if send_message(&mut sink, &message).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // This subscriber fell behind; it loses the skipped
                    // messages but keeps receiving from here on.
                    warn!(skipped, "Subscriber lagging, dropping missed broadcasts");
                }
                Err(RecvError::Closed) => break,
            },

            frame = stream.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    let reply = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::Ping { .. }) => ServerMessage::Pong {
                            timestamp: Utc::now().timestamp_millis(),
                        },
                        Err(e) => {
                            // Answered in-band to this subscriber only; the
                            // connection stays open.
                            let err = NetsimError::malformed_message(e.to_string());
                            err.log();
                            ServerMessage::Error {
                                message: format!("invalid message: {e}"),
                            }
                        }
                    };
                    if send_message(&mut sink, &reply).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    if sink.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
                _ => {}
            },
        }
    }

    debug!("WebSocket connection closed");
}

async fn send_message(
    sink: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = message.to_json().map_err(axum::Error::new)?;
    sink.send(Message::Text(json)).await
}
