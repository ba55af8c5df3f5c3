use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::handlers::{ApiResponse, ApiResult, UploadForm};
use crate::services::safety;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SelfieResponse {
    pub selfie: String,
}

/// Public route
pub async fn guidelines() -> ApiResult<Vec<&'static str>> {
    Ok(ApiResponse::ok("Safety guidelines retrieved", safety::guidelines()))
}

/// Multipart: `selfie` file.
pub async fn verify_selfie(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<SelfieResponse> {
    let mut form = UploadForm::read(multipart?).await?;
    let file = form.take_file("selfie", "No selfie uploaded")?;

    let selfie = safety::verify_selfie(&state, user.id(), file.bytes, &file.file_name).await?;
    Ok(ApiResponse::ok("Selfie verified", SelfieResponse { selfie }))
}
