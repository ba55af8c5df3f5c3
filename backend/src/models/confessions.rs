use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Confession {
    pub id: Uuid,
    pub content: String,
    /// Sender; never exposed to the recipient
    #[serde(skip_serializing)]
    pub anonymous_id: Uuid,
    pub delivered_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
