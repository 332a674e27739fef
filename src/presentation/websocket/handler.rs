//! WebSocket Connection Handler
//!
//! Bridges one websocket to one chat [`Session`](crate::application::Session):
//! text frames feed the session's read loop, and the session's outbound
//! queue is drained into the socket as JSON.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::stream::{SplitStream, Stream};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::application::Server;
use crate::domain::Message;
use crate::shared::error::ChatError;
use crate::startup::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> Result<Response, ChatError> {
    if !state.server.is_connected() {
        return Err(ChatError::NotConnected);
    }
    let server = Arc::clone(&state.server);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, server)))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, server: Arc<Server>) {
    let connection_id = Uuid::new_v4();
    tracing::debug!(connection_id = %connection_id, "New WebSocket connection");

    // Split socket for concurrent read/write
    let (mut sender, receiver) = socket.split();

    // Outbound queue of the session
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Forward queued messages to the socket until the session is gone
    let sender_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };
            if sender.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    let session = match server.accept(tx).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(connection_id = %connection_id, error = %e, "Could not accept connection");
            sender_task.abort();
            return;
        }
    };
    tracing::debug!(
        connection_id = %connection_id,
        user = %session.name(),
        "Session seated"
    );

    Arc::clone(&session).watch(text_frames(receiver)).await;

    // Dropping the last handle closes the outbound queue and ends the writer
    drop(session);
    let _ = sender_task.await;
    tracing::debug!(connection_id = %connection_id, "WebSocket connection closed");
}

/// Text payloads of the socket, ending at the first close frame or error.
fn text_frames(receiver: SplitStream<WebSocket>) -> impl Stream<Item = String> + Send {
    futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.next().await {
                Some(Ok(WsMessage::Text(text))) => return Some((text.as_str().to_owned(), receiver)),
                Some(Ok(WsMessage::Close(_))) | None => return None,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::debug!("WebSocket read failed: {}", e);
                    return None;
                }
            }
        }
    })
}
