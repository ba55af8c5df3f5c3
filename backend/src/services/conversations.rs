//! Chat messages and their real-time fan-out.
//!
//! Every operation first resolves the caller's active match; a match that is
//! inactive or that the caller is not part of reads as not found.

use serde_json::json;
use uuid::Uuid;

use crate::constants::{DEFAULT_MESSAGE_PAGE_SIZE, MAX_MESSAGE_LENGTH, MAX_MESSAGE_PAGE_SIZE};
use crate::error::{AppError, AppResult};
use crate::models::{ChatSummary, LastMessage, Match, Message, NotificationType, PublicProfile};
use crate::realtime::{ConnectionId, ServerEvent};
use crate::state::AppState;
use crate::utils::validation::bounded_text;

pub(crate) async fn active_match_for(state: &AppState, match_id: Uuid, user_id: Uuid) -> AppResult<Match> {
    state
        .directory
        .find_active_match_for(match_id, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Match not found"))
}

pub async fn send_message(state: &AppState, match_id: Uuid, sender: Uuid, content: &str) -> AppResult<Message> {
    let content = bounded_text(content, "Message", MAX_MESSAGE_LENGTH)?;
    let chat = active_match_for(state, match_id, sender).await?;
    deliver(state, &chat, sender, &content, false).await
}

/// The upload happens before anything is stored; a failed upload leaves no
/// message behind.
pub async fn send_image_message(
    state: &AppState,
    match_id: Uuid,
    sender: Uuid,
    bytes: Vec<u8>,
    file_name: &str,
) -> AppResult<Message> {
    let chat = active_match_for(state, match_id, sender).await?;
    if bytes.is_empty() {
        return Err(AppError::validation("No image uploaded"));
    }
    let url = state.media.upload(bytes, file_name).await?;
    deliver(state, &chat, sender, &url, true).await
}

async fn deliver(state: &AppState, chat: &Match, sender: Uuid, content: &str, is_image: bool) -> AppResult<Message> {
    let message = state
        .directory
        .insert_message(chat.id, sender, content, is_image)
        .await?;

    let receiver = chat.other_participant(sender);
    let text = if is_image {
        "You have a new image message!"
    } else {
        "You have a new message!"
    };
    state
        .notifier
        .create(
            receiver,
            NotificationType::NewMessage,
            text,
            json!({ "matchId": chat.id, "senderId": sender }),
        )
        .await?;

    let payload = serde_json::to_value(&message).map_err(|e| AppError::Internal(e.into()))?;
    state
        .registry
        .send_to_conversation(chat.id, ServerEvent::new("new_message", payload))
        .await;

    Ok(message)
}

/// Page 1 is the newest `page_size` messages, returned oldest first. Fetching
/// marks everything the other participant sent as read.
pub async fn get_messages(
    state: &AppState,
    match_id: Uuid,
    requester: Uuid,
    page: Option<i64>,
    page_size: Option<i64>,
) -> AppResult<Vec<Message>> {
    let page = page.unwrap_or(1);
    let page_size = page_size.unwrap_or(DEFAULT_MESSAGE_PAGE_SIZE);
    if page < 1 || !(1..=MAX_MESSAGE_PAGE_SIZE).contains(&page_size) {
        return Err(AppError::validation(format!(
            "page must be >= 1 and limit between 1 and {}",
            MAX_MESSAGE_PAGE_SIZE
        )));
    }

    let offset = (page - 1)
        .checked_mul(page_size)
        .ok_or_else(|| AppError::validation("page is out of range"))?;

    active_match_for(state, match_id, requester).await?;
    state.directory.mark_messages_read(match_id, requester).await?;

    let mut messages = state
        .directory
        .messages_page_desc(match_id, offset, page_size)
        .await?;
    messages.reverse();
    Ok(messages)
}

pub async fn delete_message(state: &AppState, message_id: Uuid, requester: Uuid) -> AppResult<()> {
    let message = state
        .directory
        .get_message(message_id)
        .await?
        .ok_or_else(|| AppError::not_found("Message not found"))?;

    if message.sender_id != requester {
        return Err(AppError::Forbidden(
            "You can only delete your own messages".to_string(),
        ));
    }

    state.directory.delete_message(message_id).await?;
    state
        .registry
        .send_to_conversation(
            message.match_id,
            ServerEvent::new("message_deleted", json!({ "messageId": message_id })),
        )
        .await;
    Ok(())
}

/// Deactivates the match and drops its history. The other participant is
/// not told in-band.
pub async fn delete_chat(state: &AppState, match_id: Uuid, requester: Uuid) -> AppResult<()> {
    active_match_for(state, match_id, requester).await?;
    if !state.directory.deactivate_match(match_id).await? {
        return Err(AppError::not_found("Match not found"));
    }
    let removed = state.directory.delete_messages_for_match(match_id).await?;
    tracing::info!("🗑️ Chat {} deleted by {} ({} messages)", match_id, requester, removed);
    Ok(())
}

pub async fn get_chats(state: &AppState, user_id: Uuid) -> AppResult<Vec<ChatSummary>> {
    let directory = &state.directory;
    let matches = directory.list_active_matches(user_id).await?;

    let mut chats = Vec::with_capacity(matches.len());
    for chat in matches {
        let other_id = chat.other_participant(user_id);
        // Cascaded deletes make this rare; skip rather than fail the listing.
        let Some(other) = directory.get_user(other_id).await? else {
            continue;
        };
        let last_message = directory.last_message(chat.id).await?.map(|m| LastMessage {
            content: m.content,
            created_at: m.created_at,
            is_image: m.is_image,
        });
        let unread_count = directory.count_unread(chat.id, user_id).await?;

        chats.push((
            last_message.as_ref().map_or(chat.created_at, |m| m.created_at),
            ChatSummary {
                match_id: chat.id,
                other_user: PublicProfile {
                    id: other.id,
                    photo: other.display_photo(),
                    name: other.name,
                },
                last_message,
                unread_count,
            },
        ));
    }

    chats.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(chats.into_iter().map(|(_, summary)| summary).collect())
}

/// `join_chats`: joins only the conversations the user is active in.
/// Returns the ids that were joined.
pub async fn join_chats(
    state: &AppState,
    connection_id: ConnectionId,
    user_id: Uuid,
    match_ids: &[Uuid],
) -> AppResult<Vec<Uuid>> {
    let mut joined = Vec::new();
    for match_id in match_ids {
        if state
            .directory
            .find_active_match_for(*match_id, user_id)
            .await?
            .is_none()
        {
            tracing::debug!("User {} tried to join foreign chat {}", user_id, match_id);
            continue;
        }
        if state.registry.join_conversation(connection_id, *match_id).await {
            joined.push(*match_id);
        }
    }
    Ok(joined)
}

pub async fn typing(state: &AppState, user_id: Uuid, match_id: Uuid, is_typing: bool) -> AppResult<()> {
    active_match_for(state, match_id, user_id).await?;
    state
        .registry
        .send_to_conversation(
            match_id,
            ServerEvent::new(
                "typing",
                json!({ "matchId": match_id, "userId": user_id, "isTyping": is_typing }),
            ),
        )
        .await;
    Ok(())
}

/// `read_message`: a participant acknowledges one message from the other side.
pub async fn read_message(state: &AppState, user_id: Uuid, match_id: Uuid, message_id: Uuid) -> AppResult<()> {
    active_match_for(state, match_id, user_id).await?;
    if state
        .directory
        .mark_message_read(message_id, match_id, user_id)
        .await?
    {
        state
            .registry
            .send_to_conversation(
                match_id,
                ServerEvent::new(
                    "message_read",
                    json!({ "messageId": message_id, "matchId": match_id, "readBy": user_id }),
                ),
            )
            .await;
    }
    Ok(())
}
