use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::handlers::{ApiJson, ApiResponse, ApiResult};
use crate::models::User;
use crate::services::accounts::{self, Registration};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<Registration>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let user = accounts::register(&state, req).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(
            "User registered successfully. Please check your email to verify your account.",
            user,
        ),
    ))
}

pub async fn verify_email(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> ApiResult<TokenResponse> {
    let token = accounts::verify_email(&state, &token).await?;
    Ok(ApiResponse::ok("Email verified successfully", TokenResponse { token }))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let token = accounts::login(&state, &req.email, &req.password).await?;
    Ok(ApiResponse::ok("Login successful", TokenResponse { token }))
}

pub async fn forgot_password(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ForgotPasswordRequest>,
) -> ApiResult<()> {
    accounts::forgot_password(&state, &req.email).await?;
    Ok(ApiResponse::done("Password reset email sent"))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> ApiResult<()> {
    accounts::reset_password(&state, &token, &req.password).await?;
    Ok(ApiResponse::done("Password reset successful"))
}
