use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "swipe_direction", rename_all = "snake_case")]
pub enum SwipeDirection {
    Like,
    Pass,
    SwipeUp,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeDirection::Like => "like",
            SwipeDirection::Pass => "pass",
            SwipeDirection::SwipeUp => "swipe_up",
        }
    }
}

impl fmt::Display for SwipeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwipeDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(SwipeDirection::Like),
            "pass" => Ok(SwipeDirection::Pass),
            "swipe_up" => Ok(SwipeDirection::SwipeUp),
            other => Err(format!("Invalid swipe direction: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Swipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub target_id: Uuid,
    pub direction: SwipeDirection,
    pub created_at: DateTime<Utc>,
}
