//! Call lifecycle: `pending -> active -> ended`, with `ended` terminal.
//!
//! Every transition is a single conditional update keyed on call id, the
//! acting party and the expected current status. A call in the wrong state
//! and a caller in the wrong role both read as not found.

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::db::StoreError;
use crate::error::{AppError, AppResult};
use crate::models::{Call, CallType, NotificationType};
use crate::realtime::ServerEvent;
use crate::services::conversations::active_match_for;
use crate::state::AppState;

pub async fn initiate_call(state: &AppState, initiator: Uuid, match_id: Uuid, call_type: CallType) -> AppResult<Call> {
    let chat = active_match_for(state, match_id, initiator).await?;
    let receiver = chat.other_participant(initiator);

    let call = match state
        .directory
        .insert_call(match_id, initiator, receiver, call_type)
        .await
    {
        Ok(call) => call,
        Err(StoreError::Duplicate(_)) => {
            return Err(AppError::conflict(
                "A call is already in progress for this match",
            ));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("📞 {} call {} from {} to {}", call_type, call.id, initiator, receiver);

    // Ring only once the notification is stored.
    state
        .notifier
        .create(
            receiver,
            NotificationType::CallInitiated,
            &format!("You have an incoming {} call!", call_type),
            json!({ "matchId": match_id, "callId": call.id }),
        )
        .await?;
    state
        .registry
        .send_to_user(
            receiver,
            ServerEvent::new(
                "call_initiated",
                json!({ "callId": call.id, "type": call_type, "initiatorId": initiator, "matchId": match_id }),
            ),
        )
        .await;

    Ok(call)
}

pub async fn accept_call(state: &AppState, receiver: Uuid, call_id: Uuid) -> AppResult<Call> {
    let call = state
        .directory
        .accept_call(call_id, receiver, Utc::now())
        .await?
        .ok_or_else(|| AppError::not_found("Call not found or not in pending state"))?;

    state
        .registry
        .send_to_user(
            call.initiator_id,
            ServerEvent::new(
                "call_accepted",
                json!({
                    "callId": call.id,
                    "matchId": call.match_id,
                    "receiverId": receiver,
                    "callType": call.call_type,
                }),
            ),
        )
        .await;
    Ok(call)
}

pub async fn reject_call(state: &AppState, receiver: Uuid, call_id: Uuid) -> AppResult<Call> {
    let call = state
        .directory
        .reject_call(call_id, receiver, Utc::now())
        .await?
        .ok_or_else(|| AppError::not_found("Call not found or not in pending state"))?;

    state
        .registry
        .send_to_user(
            call.initiator_id,
            ServerEvent::new(
                "call_rejected",
                json!({ "callId": call.id, "matchId": call.match_id, "receiverId": receiver }),
            ),
        )
        .await;
    Ok(call)
}

pub async fn end_call(state: &AppState, initiator: Uuid, call_id: Uuid) -> AppResult<Call> {
    let call = state
        .directory
        .end_call(call_id, initiator, Utc::now())
        .await?
        .ok_or_else(|| {
            AppError::not_found("Call not found, already ended, or you are not the initiator")
        })?;

    state
        .registry
        .send_to_user(call.receiver_id, ServerEvent::new("call_ended", json!({ "callId": call.id })))
        .await;
    Ok(call)
}

/// Most recent call of a match the caller is active in.
pub async fn call_status(state: &AppState, user_id: Uuid, match_id: Uuid) -> AppResult<Call> {
    active_match_for(state, match_id, user_id).await?;
    state
        .directory
        .latest_call_for_match(match_id)
        .await?
        .ok_or_else(|| AppError::not_found("No call found for this match"))
}

/// Relays an opaque signaling payload to the other participant. Sender and
/// recipient must share an active match. `end-call` arrives as `call_ended`.
pub async fn relay_signal(
    state: &AppState,
    from: Uuid,
    to: Uuid,
    event: &str,
    payload: serde_json::Value,
) -> AppResult<usize> {
    if state
        .directory
        .find_active_match_between(from, to)
        .await?
        .is_none()
    {
        return Err(AppError::not_found("No active match with that user"));
    }

    let delivered_as = if event == "end-call" { "call_ended" } else { event };
    Ok(state
        .registry
        .send_to_user(
            to,
            ServerEvent::new(delivered_as, json!({ "payload": payload, "fromUserId": from })),
        )
        .await)
}
