use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::media::{sanitize_file_name, MediaStore};
use crate::utils::CloudinaryConfig;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Unsigned uploads through a Cloudinary upload preset.
#[derive(Debug, Clone)]
pub struct CloudinaryMediaStore {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryMediaStore {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        )
    }
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn upload(&self, bytes: Vec<u8>, name: &str) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::validation("Uploaded file is empty"));
        }

        let file_name = sanitize_file_name(name);
        let public_id = format!("photos/{}-{}", Utc::now().timestamp_millis(), file_name);
        let form = Form::new()
            .text("upload_preset", self.config.upload_preset.clone())
            .text("public_id", public_id)
            .part("file", Part::bytes(bytes).file_name(file_name));

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("cloudinary request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "cloudinary responded {}: {}",
                status, body
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("cloudinary response unreadable: {}", e)))?;

        Ok(uploaded.secure_url)
    }
}
