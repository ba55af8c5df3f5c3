use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::handlers::{ApiJson, ApiResponse, ApiResult};
use crate::models::{Call, CallType};
use crate::services::calls;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateCallRequest {
    pub match_id: Uuid,
    #[serde(rename = "type")]
    pub call_type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallIdRequest {
    pub call_id: Uuid,
}

pub async fn initiate_call(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<InitiateCallRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Call>>)> {
    let call_type: CallType = req.call_type.parse().map_err(AppError::Validation)?;
    let call = calls::initiate_call(&state, user.id(), req.match_id, call_type).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok("Call initiated", call)))
}

pub async fn accept_call(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CallIdRequest>,
) -> ApiResult<Call> {
    let call = calls::accept_call(&state, user.id(), req.call_id).await?;
    Ok(ApiResponse::ok("Call accepted", call))
}

pub async fn reject_call(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CallIdRequest>,
) -> ApiResult<Call> {
    let call = calls::reject_call(&state, user.id(), req.call_id).await?;
    Ok(ApiResponse::ok("Call rejected", call))
}

pub async fn end_call(
    State(state): State<AppState>,
    user: AuthUser,
    Path(call_id): Path<Uuid>,
) -> ApiResult<Call> {
    let call = calls::end_call(&state, user.id(), call_id).await?;
    Ok(ApiResponse::ok("Call ended", call))
}

pub async fn call_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(match_id): Path<Uuid>,
) -> ApiResult<Call> {
    let call = calls::call_status(&state, user.id(), match_id).await?;
    Ok(ApiResponse::ok("Call status retrieved", call))
}
