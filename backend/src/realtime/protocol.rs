//! Client-to-server frames
//!
//! Frames are JSON text: `{"event": "<name>", "data": <payload>}`.

use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingData {
    pub match_id: Uuid,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadMessageData {
    pub message_id: Uuid,
    pub match_id: Uuid,
}

/// Opaque signaling payload addressed to the other call participant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalData {
    pub to_user_id: Uuid,
    #[serde(default)]
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "join_chats")]
    JoinChats(Vec<Uuid>),
    #[serde(rename = "typing")]
    Typing(TypingData),
    #[serde(rename = "read_message")]
    ReadMessage(ReadMessageData),
    #[serde(rename = "offer")]
    Offer(SignalData),
    #[serde(rename = "answer")]
    Answer(SignalData),
    #[serde(rename = "ice-candidate")]
    IceCandidate(SignalData),
    #[serde(rename = "end-call")]
    EndCall(SignalData),
}

impl ClientEvent {
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}
