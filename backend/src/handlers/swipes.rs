use axum::extract::{Path, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppError;
use crate::handlers::{ApiJson, ApiResponse, ApiResult};
use crate::models::{Candidate, SwipeDirection};
use crate::services::matching::{self, SwipeOutcome};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    pub target_id: Uuid,
    pub direction: String,
}

pub async fn potential_matches(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<Candidate>> {
    let candidates = matching::potential_matches(&state, user.id()).await?;
    Ok(ApiResponse::ok("Potential matches retrieved", candidates))
}

pub async fn record_swipe(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<SwipeRequest>,
) -> ApiResult<SwipeOutcome> {
    let direction: SwipeDirection = req.direction.parse().map_err(AppError::Validation)?;
    let outcome = matching::record_swipe(&state, user.id(), req.target_id, direction).await?;
    let message = if outcome.matched { "It's a match!" } else { "Swipe recorded" };
    Ok(ApiResponse::ok(message, outcome))
}

pub async fn undo_swipe(
    State(state): State<AppState>,
    user: AuthUser,
    Path(swipe_id): Path<Uuid>,
) -> ApiResult<()> {
    matching::undo_swipe(&state, user.id(), swipe_id).await?;
    Ok(ApiResponse::done("Swipe undone"))
}
