use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::handlers::{ApiResponse, ApiResult};
use crate::models::Notification;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct Cleared {
    pub deleted: u64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Vec<Notification>> {
    let notifications = state.notifier.list(user.id(), params.unread_only).await?;
    Ok(ApiResponse::ok("Notifications retrieved", notifications))
}

pub async fn mark_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<()> {
    state.notifier.mark_read(user.id(), notification_id).await?;
    Ok(ApiResponse::done("Notification marked as read"))
}

pub async fn clear_notifications(State(state): State<AppState>, user: AuthUser) -> ApiResult<Cleared> {
    let deleted = state.notifier.clear_all(user.id()).await?;
    Ok(ApiResponse::ok("Notifications cleared", Cleared { deleted }))
}
