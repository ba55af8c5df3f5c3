use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub match_id: Uuid,
    pub sender_id: Uuid,
    /// Text, or the media URL when `is_image` is set
    pub content: String,
    pub is_image: bool,
    pub read_status: bool,
    pub created_at: DateTime<Utc>,
}
