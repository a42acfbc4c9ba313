//! Dashboard WebSocket: live order push
//!
//! GET /api/socket?token=<JWT>
//! Browsers cannot set headers on WebSocket requests, so the token comes in
//! the query string. The session cookie or a bearer header also works.
//!
//! Server → dashboard only ([`LiveMessage`] JSON text frames). Anything the
//! client sends besides close is ignored.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{Router, routing::get};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::live::LiveMessage;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio::time::Duration;

use crate::auth::session::{token_from_headers, verify_token};
use crate::state::AppState;

/// Maximum concurrent dashboard sockets per restaurant
const MAX_SOCKETS_PER_RESTAURANT: usize = 20;

const PING_INTERVAL: Duration = Duration::from_secs(30);

pub fn router() -> Router<AppState> {
    Router::new().route("/api/socket", get(handle_socket))
}

#[derive(Deserialize)]
pub struct SocketAuthQuery {
    token: Option<String>,
}

/// GET /api/socket
pub async fn handle_socket(
    State(state): State<AppState>,
    Query(query): Query<SocketAuthQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    let token = query
        .token
        .or_else(|| token_from_headers(&headers))
        .ok_or_else(AppError::not_authenticated)?;
    let identity = verify_token(&token, &state.jwt_secret).inspect_err(|e| {
        tracing::debug!("Socket token rejected: {e}");
    })?;
    let restaurant_id = identity.restaurant_id;

    {
        let counter = state
            .socket_connections
            .entry(restaurant_id)
            .or_insert_with(|| AtomicUsize::new(0));
        let prev = counter.fetch_add(1, Ordering::SeqCst);
        if prev >= MAX_SOCKETS_PER_RESTAURANT {
            counter.fetch_sub(1, Ordering::SeqCst);
            return Err(AppError::with_message(
                ErrorCode::ResourceLimitExceeded,
                format!("Too many dashboard connections ({prev}/{MAX_SOCKETS_PER_RESTAURANT})"),
            ));
        }
    }

    Ok(ws.on_upgrade(move |socket| socket_session(socket, state, restaurant_id)))
}

async fn socket_session(socket: WebSocket, state: AppState, restaurant_id: i64) {
    let (mut sink, mut stream) = socket.split();
    let mut hub_rx = state.live_orders.subscribe(restaurant_id);

    tracing::info!(restaurant_id, "Dashboard socket connected");

    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    ping_interval.tick().await; // skip immediate

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            event = hub_rx.recv() => {
                match event {
                    Ok(msg) => {
                        if send_message(&mut sink, &msg).await.is_err() {
                            break;
                        }
                    }
                    // Missed messages are not replayed; the dashboard refetches
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(restaurant_id, lagged = n, "Dashboard socket lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    drop(hub_rx);
    if let Some(counter) = state.socket_connections.get(&restaurant_id) {
        counter.fetch_sub(1, Ordering::SeqCst);
    }
    state.live_orders.prune(restaurant_id);

    tracing::info!(restaurant_id, "Dashboard socket disconnected");
}

async fn send_message<S>(sink: &mut S, msg: &LiveMessage) -> Result<(), ()>
where
    S: futures::Sink<Message, Error = axum::Error> + Unpin,
{
    let json = serde_json::to_string(msg).map_err(|e| {
        tracing::error!(kind = msg.kind(), error = %e, "Failed to serialize live message");
    })?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
