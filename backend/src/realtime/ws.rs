//! `/ws` endpoint
//!
//! The bearer credential is checked before the upgrade, so a rejected client
//! never appears in the registry. After the upgrade the socket is split: the
//! read half dispatches client events, the write half drains the registry
//! channel for this connection.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{bearer_token, decode_token};
use crate::error::{AppError, AppResult};
use crate::realtime::{ClientEvent, ConnectionId, ServerEvent};
use crate::services::{calls, conversations};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let token = bearer_token(&headers)
        .map(str::to_string)
        .or(params.token)
        .ok_or_else(|| AppError::Unauthorized("No token provided".to_string()))?;
    let user_id = decode_token(&token, &state.config.jwt_secret)?;

    Ok(ws.on_upgrade(move |socket| run_connection(socket, state, user_id)))
}

async fn run_connection(socket: WebSocket, state: AppState, user_id: Uuid) {
    let (connection_id, mut outbound) = state.registry.register(user_id).await;
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = handle_client_event(&state, connection_id, user_id, text.as_str()).await {
                        let frame = ServerEvent::new("error", json!({ "message": e.public_message() }));
                        if send_frame(&mut sink, &frame).await.is_err() {
                            break;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!("Socket error on {}: {}", connection_id, e);
                    break;
                }
            },
            event = outbound.recv() => match event {
                Some(event) => {
                    if send_frame(&mut sink, &event).await.is_err() {
                        break;
                    }
                }
                // The registry dropped this connection
                None => break,
            },
        }
    }

    let _ = sink.close().await;
    state.registry.remove(connection_id).await;
}

async fn send_frame(sink: &mut SplitSink<WebSocket, Message>, event: &ServerEvent) -> anyhow::Result<()> {
    let text = serde_json::to_string(event)?;
    sink.send(Message::Text(text.into())).await?;
    Ok(())
}

/// Applies one client frame on behalf of `user_id`.
pub async fn handle_client_event(
    state: &AppState,
    connection_id: ConnectionId,
    user_id: Uuid,
    text: &str,
) -> AppResult<()> {
    let event = ClientEvent::parse(text)
        .map_err(|e| AppError::validation(format!("Malformed event: {}", e)))?;

    match event {
        ClientEvent::JoinChats(match_ids) => {
            conversations::join_chats(state, connection_id, user_id, &match_ids).await?;
        }
        ClientEvent::Typing(typing) => {
            conversations::typing(state, user_id, typing.match_id, typing.is_typing).await?;
        }
        ClientEvent::ReadMessage(read) => {
            conversations::read_message(state, user_id, read.match_id, read.message_id).await?;
        }
        ClientEvent::Offer(signal) => {
            calls::relay_signal(state, user_id, signal.to_user_id, "offer", signal.payload).await?;
        }
        ClientEvent::Answer(signal) => {
            calls::relay_signal(state, user_id, signal.to_user_id, "answer", signal.payload).await?;
        }
        ClientEvent::IceCandidate(signal) => {
            calls::relay_signal(state, user_id, signal.to_user_id, "ice-candidate", signal.payload).await?;
        }
        ClientEvent::EndCall(signal) => {
            calls::relay_signal(state, user_id, signal.to_user_id, "end-call", signal.payload).await?;
        }
    }
    Ok(())
}
