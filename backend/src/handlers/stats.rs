use axum::extract::State;

use crate::auth::AuthUser;
use crate::handlers::{ApiResponse, ApiResult};
use crate::services::stats::{self, GhostingStats};
use crate::state::AppState;

pub async fn ghosting_stats(State(state): State<AppState>, user: AuthUser) -> ApiResult<GhostingStats> {
    let stats = stats::ghosting_stats(&state, user.id()).await?;
    Ok(ApiResponse::ok("Ghosting stats retrieved", stats))
}
