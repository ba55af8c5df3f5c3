use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::handlers::{ApiJson, ApiResponse, ApiResult, UploadForm};
use crate::models::{ChatSummary, Message};
use crate::services::conversations;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub match_id: Uuid,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn get_chats(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<ChatSummary>> {
    let chats = conversations::get_chats(&state, user.id()).await?;
    Ok(ApiResponse::ok("Chats retrieved", chats))
}

pub async fn get_messages(
    State(state): State<AppState>,
    user: AuthUser,
    Path(match_id): Path<Uuid>,
    Query(params): Query<PageParams>,
) -> ApiResult<Vec<Message>> {
    let messages =
        conversations::get_messages(&state, match_id, user.id(), params.page, params.limit).await?;
    Ok(ApiResponse::ok("Messages retrieved", messages))
}

pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<SendMessageRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Message>>)> {
    let message = conversations::send_message(&state, req.match_id, user.id(), &req.content).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok("Message sent", message)))
}

/// Multipart: `matchId` text, `image` file.
pub async fn send_image_message(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Message>>)> {
    let mut form = UploadForm::read(multipart?).await?;
    let match_id: Uuid = form
        .field("matchId")
        .ok_or_else(|| AppError::validation("matchId is required"))?
        .parse()
        .map_err(|_| AppError::validation("Invalid matchId"))?;
    let file = form.take_file("image", "No image uploaded")?;

    let message =
        conversations::send_image_message(&state, match_id, user.id(), file.bytes, &file.file_name).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok("Image sent", message)))
}

pub async fn delete_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(message_id): Path<Uuid>,
) -> ApiResult<()> {
    conversations::delete_message(&state, message_id, user.id()).await?;
    Ok(ApiResponse::done("Message deleted"))
}

pub async fn delete_chat(
    State(state): State<AppState>,
    user: AuthUser,
    Path(match_id): Path<Uuid>,
) -> ApiResult<()> {
    conversations::delete_chat(&state, match_id, user.id()).await?;
    Ok(ApiResponse::done("Chat deleted"))
}
