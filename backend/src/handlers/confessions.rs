use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::handlers::{ApiJson, ApiResponse, ApiResult};
use crate::services::confessions;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConfessionRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ConfessionSent {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ConfessionContent {
    pub content: String,
}

pub async fn send_confession(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ConfessionRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ConfessionSent>>)> {
    let confession = confessions::send_confession(&state, user.id(), &req.content).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Confession sent anonymously", ConfessionSent { id: confession.id }),
    ))
}

pub async fn random_confession(State(state): State<AppState>, user: AuthUser) -> ApiResult<ConfessionContent> {
    let confession = confessions::random_confession(&state, user.id()).await?;
    Ok(ApiResponse::ok(
        "Confession retrieved",
        ConfessionContent { content: confession.content },
    ))
}
