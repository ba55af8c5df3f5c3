use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::handlers::{ApiJson, ApiResponse, ApiResult, UploadForm};
use crate::models::{Photo, ProfileUpdate, User};
use crate::services::profiles;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct ProfilePicResponse {
    pub selfie: String,
}

pub async fn get_profile(State(state): State<AppState>, user: AuthUser) -> ApiResult<User> {
    let profile = profiles::get_profile(&state, user.id()).await?;
    Ok(ApiResponse::ok("Profile retrieved", profile))
}

pub async fn edit_profile(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> ApiResult<User> {
    let profile = profiles::edit_profile(&state, user.id(), update).await?;
    Ok(ApiResponse::ok("Profile updated", profile))
}

pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<()> {
    profiles::change_password(&state, user.id(), &req.old_password, &req.new_password).await?;
    Ok(ApiResponse::done("Password changed successfully"))
}

pub async fn delete_profile(State(state): State<AppState>, user: AuthUser) -> ApiResult<()> {
    profiles::delete_profile(&state, user.id()).await?;
    Ok(ApiResponse::done("Profile deleted"))
}

/// Multipart: `photo` file, optional `caption` text.
pub async fn add_photo(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Photo>>)> {
    let mut form = UploadForm::read(multipart?).await?;
    let file = form.take_file("photo", "No photo uploaded")?;
    let caption = form.field("caption").map(str::to_string);

    let photo = profiles::add_photo(&state, user.id(), file.bytes, &file.file_name, caption).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok("Photo added", photo)))
}

pub async fn delete_photo(
    State(state): State<AppState>,
    user: AuthUser,
    Path(photo_id): Path<Uuid>,
) -> ApiResult<()> {
    profiles::delete_photo(&state, user.id(), photo_id).await?;
    Ok(ApiResponse::done("Photo deleted"))
}

pub async fn update_profile_pic(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<ProfilePicResponse> {
    let mut form = UploadForm::read(multipart?).await?;
    let file = form.take_file("photo", "No photo uploaded")?;

    let selfie = profiles::update_profile_pic(&state, user.id(), file.bytes, &file.file_name).await?;
    Ok(ApiResponse::ok("Profile picture updated", ProfilePicResponse { selfie }))
}
