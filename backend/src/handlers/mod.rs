pub mod auth;
pub mod calls;
pub mod chats;
pub mod confessions;
pub mod notifications;
pub mod safety;
pub mod stats;
pub mod swipes;
pub mod users;

use std::collections::HashMap;

use axum::extract::{DefaultBodyLimit, FromRequest, Multipart};
use axum::http::{HeaderValue, Method};
use axum::response::Json;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::constants::MAX_UPLOAD_BYTES;
use crate::error::{AppError, AppResult};
use crate::realtime::ws::ws_handler;
use crate::state::AppState;

/// Success envelope shared by every route.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn done(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: None,
        })
    }
}

pub type ApiResult<T> = AppResult<Json<ApiResponse<T>>>;

/// `Json` whose rejections render as the error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// Multipart body split into text fields and file parts.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl UploadForm {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await?.to_vec();
                    form.files.insert(name, UploadedFile { bytes, file_name });
                }
                None => {
                    let text = field.text().await?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str, missing: &str) -> AppResult<UploadedFile> {
        self.files
            .remove(name)
            .ok_or_else(|| AppError::validation(missing))
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors_layer = create_cors_layer();
    let media_dir = state.config.media_dir.clone();

    let api = Router::new()
        // Accounts
        .route("/auth/register", post(auth::register))
        .route("/auth/verify/{token}", get(auth::verify_email))
        .route("/auth/login", post(auth::login))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/reset-password/{token}", post(auth::reset_password))
        // Profiles
        .route(
            "/users/me",
            get(users::get_profile)
                .put(users::edit_profile)
                .delete(users::delete_profile),
        )
        .route("/users/me/password", put(users::change_password))
        .route("/users/photos", post(users::add_photo))
        .route("/users/photos/{photo_id}", delete(users::delete_photo))
        .route("/users/profile-pic", post(users::update_profile_pic))
        // Discovery
        .route("/potential-matches", get(swipes::potential_matches))
        .route("/swipes", post(swipes::record_swipe))
        .route("/swipes/undo/{swipe_id}", post(swipes::undo_swipe))
        // Chats
        .route("/chats", get(chats::get_chats))
        .route("/chats/message", post(chats::send_message))
        .route("/chats/image-message", post(chats::send_image_message))
        .route("/chats/messages/{message_id}", delete(chats::delete_message))
        .route("/chats/{match_id}", delete(chats::delete_chat))
        .route("/chats/{match_id}/messages", get(chats::get_messages))
        // Calls
        .route("/calls/initiate", post(calls::initiate_call))
        .route("/calls/accept", post(calls::accept_call))
        .route("/calls/reject", post(calls::reject_call))
        .route("/calls/end/{call_id}", post(calls::end_call))
        .route("/calls/status/{match_id}", get(calls::call_status))
        // Confessions
        .route("/confessions", post(confessions::send_confession))
        .route("/confessions/random", get(confessions::random_confession))
        // Notifications
        .route(
            "/notifications",
            get(notifications::list_notifications).delete(notifications::clear_notifications),
        )
        .route("/notifications/{notification_id}/read", put(notifications::mark_read))
        // Stats & safety
        .route("/stats/ghosting", get(stats::ghosting_stats))
        .route("/verify/selfie", post(safety::verify_selfie))
        .route("/safety/guidelines", get(safety::guidelines));

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(ws_handler))
        .nest("/api", api)
        .nest_service("/media", ServeDir::new(media_dir))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

fn create_cors_layer() -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .allow_credentials(false);

    // ALLOWED_ORIGINS holds a comma separated list of domains
    if let Ok(cors_origins) = std::env::var("ALLOWED_ORIGINS") {
        let origins: Vec<HeaderValue> = cors_origins
            .split(',')
            .filter_map(|origin| {
                let trimmed = origin.trim();
                if !trimmed.is_empty() {
                    trimmed.parse().ok()
                } else {
                    None
                }
            })
            .collect();

        if !origins.is_empty() {
            cors = cors.allow_origin(origins);
        } else {
            cors = cors.allow_origin(Any);
        }
    } else {
        // Permissive for development
        cors = cors.allow_origin(Any);
    }

    cors
}

async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
