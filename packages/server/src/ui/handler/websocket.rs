//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{domain::Identity, ui::state::AppState};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let identity = match handshake_token(&query, &headers) {
        Some(token) => match state.token_verifier.verify(token) {
            Ok(identity) => Some(identity),
            Err(e) => {
                tracing::warn!("Rejecting WebSocket handshake: {}", e);
                return Err(StatusCode::UNAUTHORIZED);
            }
        },
        None => None,
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, identity)))
}

/// `?token=` を優先し、無ければ `Authorization: Bearer` を使う（空文字は未指定扱い）
fn handshake_token<'a>(query: &'a ConnectQuery, headers: &'a HeaderMap) -> Option<&'a str> {
    let from_query = query.token.as_deref().map(str::trim);
    let from_header = || {
        headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
    };
    from_query
        .filter(|token| !token.is_empty())
        .or_else(|| from_header().filter(|token| !token.is_empty()))
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Channel receiver for events addressed to this connection
/// * `sender` - WebSocket sink to send messages to this client
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, identity: Option<Identity>) {
    let (sender, mut receiver) = socket.split();

    // Create a channel for this connection to receive events
    let (tx, rx) = mpsc::unbounded_channel();
    let connection = state
        .connect_participant_usecase
        .execute(identity, tx)
        .await;
    let connection_id = connection.id;

    let router = state.event_router.clone();

    // Inbound frames are dispatched one at a time to keep per-connection order
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::debug!("WebSocket error on '{}': {}", connection.id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    // 失敗は router 側で記録済み
                    let _ = router.dispatch(&connection, text.as_str()).await;
                }
                Message::Binary(_) => {
                    tracing::warn!("Ignoring binary frame from '{}'", connection.id);
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", connection.id);
                    break;
                }
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    let departures = state
        .disconnect_participant_usecase
        .execute(&connection_id)
        .await;
    tracing::info!(
        "Client '{}' disconnected (left {} room(s))",
        connection_id,
        departures.len()
    );
}
