use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WsParams {
    pub token: String,
}

/// Browsers cannot set headers on a websocket handshake, so the session
/// token travels in the query string.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(params): Query<WsParams>,
) -> Result<impl IntoResponse, AppError> {
    let admin = state.admins.authenticate(&params.token).await?;
    let admin_id = admin.admin_id;
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, admin_id)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, admin_id: String) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.lifecycle.subscribe();

    info!(admin_id = %admin_id, "websocket client connected");

    let send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "websocket client lagging behind transition feed");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize transition event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(_msg)) = receiver.next().await {}
    });

    race(send_task, recv_task).await;

    info!(admin_id = %admin_id, "websocket client disconnected");
}

/// Waits for whichever task finishes first and aborts the other.
async fn race<A, B>(mut first: JoinHandle<A>, mut second: JoinHandle<B>) {
    tokio::select! {
        _ = &mut first => second.abort(),
        _ = &mut second => first.abort(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::race;

    #[tokio::test]
    async fn finishing_task_aborts_the_other() {
        let (held_tx, held_rx) = oneshot::channel::<()>();

        let finished = tokio::spawn(async {});
        let stuck = tokio::spawn(async move {
            let _held = held_tx;
            std::future::pending::<()>().await;
        });

        race(finished, stuck).await;

        let outcome = tokio::time::timeout(Duration::from_secs(1), held_rx)
            .await
            .expect("aborted task should drop its sender");
        assert!(outcome.is_err());
    }
}
