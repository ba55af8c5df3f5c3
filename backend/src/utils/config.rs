use anyhow::Result;
use std::env;
use std::path::PathBuf;
use crate::constants::{
    DEFAULT_APP_URL, DEFAULT_JWT_EXPIRY_HOURS, DEFAULT_MEDIA_DIR, DEFAULT_PENDING_CALL_TIMEOUT_SECS,
    DEFAULT_SERVER_PORT,
};

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub upload_preset: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub app_url: String,
    pub resend_api_key: Option<String>,
    pub email_from: String,
    pub cloudinary: Option<CloudinaryConfig>,
    pub media_dir: PathBuf,
    pub pending_call_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let cloudinary = match (
            optional_var("CLOUDINARY_CLOUD_NAME"),
            optional_var("CLOUDINARY_UPLOAD_PRESET"),
        ) {
            (Some(cloud_name), Some(upload_preset)) => Some(CloudinaryConfig {
                cloud_name,
                upload_preset,
            }),
            _ => None,
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_SERVER_PORT.to_string())
                .parse()
                .unwrap_or(DEFAULT_SERVER_PORT),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set"))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_JWT_EXPIRY_HOURS),
            app_url: optional_var("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.to_string()),
            resend_api_key: optional_var("RESEND_API_KEY"),
            email_from: optional_var("EMAIL_FROM")
                .unwrap_or_else(|| "L.I.F <onboarding@resend.dev>".to_string()),
            cloudinary,
            media_dir: optional_var("MEDIA_DIR")
                .unwrap_or_else(|| DEFAULT_MEDIA_DIR.to_string())
                .into(),
            pending_call_timeout_secs: env::var("PENDING_CALL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PENDING_CALL_TIMEOUT_SECS),
        })
    }

    /// Defaults for everything but the signing secret; no outside providers.
    pub fn local(jwt_secret: impl Into<String>) -> Self {
        Self {
            port: DEFAULT_SERVER_PORT,
            jwt_secret: jwt_secret.into(),
            jwt_expiry_hours: DEFAULT_JWT_EXPIRY_HOURS,
            app_url: DEFAULT_APP_URL.to_string(),
            resend_api_key: None,
            email_from: "L.I.F <onboarding@resend.dev>".to_string(),
            cloudinary: None,
            media_dir: DEFAULT_MEDIA_DIR.into(),
            pending_call_timeout_secs: DEFAULT_PENDING_CALL_TIMEOUT_SECS,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
