use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "call_type", rename_all = "lowercase")]
pub enum CallType {
    Audio,
    Video,
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallType::Audio => f.write_str("audio"),
            CallType::Video => f.write_str("video"),
        }
    }
}

impl FromStr for CallType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "audio" => Ok(CallType::Audio),
            "video" => Ok(CallType::Video),
            other => Err(format!("Invalid call type: {}", other)),
        }
    }
}

/// `Pending -> Active -> Ended`, or `Pending -> Ended`. `Ended` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "call_status", rename_all = "lowercase")]
pub enum CallStatus {
    Pending,
    Active,
    Ended,
}

impl CallStatus {
    pub fn is_in_flight(&self) -> bool {
        matches!(self, CallStatus::Pending | CallStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    pub id: Uuid,
    pub match_id: Uuid,
    pub initiator_id: Uuid,
    pub receiver_id: Uuid,
    #[serde(rename = "type")]
    pub call_type: CallType,
    pub status: CallStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_statuses() {
        assert!(CallStatus::Pending.is_in_flight());
        assert!(CallStatus::Active.is_in_flight());
        assert!(!CallStatus::Ended.is_in_flight());
    }

    #[test]
    fn test_parse_call_type() {
        assert_eq!("video".parse::<CallType>().unwrap(), CallType::Video);
        assert!("hologram".parse::<CallType>().is_err());
    }
}
