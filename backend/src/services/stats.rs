use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::constants::GHOSTING_THRESHOLD_HOURS;
use crate::error::AppResult;
use crate::models::{Match, Message};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GhostingStats {
    /// Hours, rounded to two decimals
    pub average_response_time: f64,
    pub ghosted_count: usize,
    pub total_matches: usize,
}

/// `messages` must be in chronological order.
///
/// A response is the user's first message after one or more messages from
/// the other participant; its time is measured from the earliest of those.
/// A match counts as ghosted when the user's latest message has no later
/// reply and is older than the threshold.
pub fn compute_ghosting(user_id: Uuid, matches: &[Match], messages: &[Message], now: DateTime<Utc>) -> GhostingStats {
    let mut by_match: HashMap<Uuid, Vec<&Message>> = HashMap::new();
    for message in messages {
        by_match.entry(message.match_id).or_default().push(message);
    }

    let threshold = Duration::hours(GHOSTING_THRESHOLD_HOURS);
    let mut total_hours = 0.0;
    let mut responses = 0usize;
    let mut ghosted_count = 0;

    for chat in matches {
        let Some(thread) = by_match.get(&chat.id) else {
            continue;
        };

        let mut waiting_since: Option<DateTime<Utc>> = None;
        for message in thread {
            if message.sender_id != user_id {
                waiting_since.get_or_insert(message.created_at);
            } else if let Some(since) = waiting_since.take() {
                total_hours += (message.created_at - since).num_seconds() as f64 / 3600.0;
                responses += 1;
            }
        }

        let last_own = thread.iter().rposition(|m| m.sender_id == user_id);
        if let Some(index) = last_own {
            let replied = thread[index + 1..].iter().any(|m| m.sender_id != user_id);
            if !replied && now - thread[index].created_at > threshold {
                ghosted_count += 1;
            }
        }
    }

    let average = if responses > 0 {
        total_hours / responses as f64
    } else {
        0.0
    };

    GhostingStats {
        average_response_time: (average * 100.0).round() / 100.0,
        ghosted_count,
        total_matches: matches.len(),
    }
}

pub async fn ghosting_stats(state: &AppState, user_id: Uuid) -> AppResult<GhostingStats> {
    let matches = state.directory.list_active_matches(user_id).await?;
    let ids: Vec<Uuid> = matches.iter().map(|m| m.id).collect();
    let messages = state.directory.messages_for_matches(&ids).await?;
    Ok(compute_ghosting(user_id, &matches, &messages, Utc::now()))
}
