//! Retention sweeps and pending-call expiry.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use tokio::time;

use crate::constants::{
    ENDED_CALL_RETENTION_DAYS, PENDING_CALL_SWEEP_INTERVAL_SECS, UNREAD_MESSAGE_RETENTION_DAYS,
};
use crate::db::Directory;
use crate::error::AppResult;
use crate::models::Call;
use crate::realtime::ServerEvent;
use crate::state::AppState;

/// Unread messages older than the retention window.
pub async fn sweep_unread_messages(directory: &dyn Directory, now: DateTime<Utc>) -> AppResult<u64> {
    let cutoff = now - Duration::days(UNREAD_MESSAGE_RETENTION_DAYS);
    Ok(directory.delete_unread_messages_before(cutoff).await?)
}

/// Ended calls whose end time is older than the retention window.
pub async fn sweep_ended_calls(directory: &dyn Directory, now: DateTime<Utc>) -> AppResult<u64> {
    let cutoff = now - Duration::days(ENDED_CALL_RETENTION_DAYS);
    Ok(directory.delete_ended_calls_before(cutoff).await?)
}

/// Ends calls left pending longer than `timeout` and tells both parties.
pub async fn expire_pending_calls(state: &AppState, now: DateTime<Utc>, timeout: StdDuration) -> AppResult<Vec<Call>> {
    let timeout = Duration::from_std(timeout).unwrap_or_else(|_| Duration::seconds(60));
    let expired = state.directory.expire_pending_calls(now - timeout, now).await?;

    for call in &expired {
        let event = ServerEvent::new("call_ended", json!({ "callId": call.id, "reason": "timeout" }));
        for party in [call.initiator_id, call.receiver_id] {
            state.registry.send_to_user(party, event.clone()).await;
        }
    }
    if !expired.is_empty() {
        tracing::info!("⏰ Expired {} unanswered call(s)", expired.len());
    }
    Ok(expired)
}

/// Runs `expire_pending_calls` forever; spawned by the server.
pub async fn run_pending_call_expiry(state: AppState) {
    let timeout = StdDuration::from_secs(state.config.pending_call_timeout_secs);
    let mut interval = time::interval(StdDuration::from_secs(PENDING_CALL_SWEEP_INTERVAL_SECS));

    loop {
        interval.tick().await;
        if let Err(e) = expire_pending_calls(&state, Utc::now(), timeout).await {
            tracing::error!("❌ Failed to expire pending calls: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CallStatus, CallType};
    use crate::services::{calls, conversations};
    use crate::testing::{drain, event_names, TestApp};

    #[tokio::test]
    async fn test_pending_calls_expire_and_both_parties_hear() {
        let app = TestApp::new().await;
        let (a, b, m) = app.matched_pair().await;
        let (_, mut a_rx) = app.connect(a.id).await;
        let (_, mut b_rx) = app.connect(b.id).await;
        let call = calls::initiate_call(&app.state, a.id, m.id, CallType::Audio).await.unwrap();
        drain(&mut b_rx);

        // Not yet stale
        let none = expire_pending_calls(&app.state, Utc::now(), StdDuration::from_secs(60))
            .await
            .unwrap();
        assert!(none.is_empty());

        let later = Utc::now() + Duration::seconds(61);
        let expired = expire_pending_calls(&app.state, later, StdDuration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, call.id);
        assert_eq!(expired[0].status, CallStatus::Ended);
        assert!(expired[0].start_time.is_none());
        assert_eq!(event_names(&drain(&mut a_rx)), vec!["call_ended"]);
        assert_eq!(event_names(&drain(&mut b_rx)), vec!["call_ended"]);

        // The match is free for a new call
        calls::initiate_call(&app.state, b.id, m.id, CallType::Video).await.unwrap();
    }

    #[tokio::test]
    async fn test_active_calls_do_not_expire() {
        let app = TestApp::new().await;
        let (a, b, m) = app.matched_pair().await;
        let call = calls::initiate_call(&app.state, a.id, m.id, CallType::Audio).await.unwrap();
        calls::accept_call(&app.state, b.id, call.id).await.unwrap();

        let later = Utc::now() + Duration::hours(1);
        assert!(expire_pending_calls(&app.state, later, StdDuration::from_secs(60))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unread_sweep_keeps_read_and_recent() {
        let app = TestApp::new().await;
        let (a, b, m) = app.matched_pair().await;
        conversations::send_message(&app.state, m.id, a.id, "read").await.unwrap();
        conversations::get_messages(&app.state, m.id, b.id, None, None).await.unwrap();
        conversations::send_message(&app.state, m.id, a.id, "unread").await.unwrap();
        let directory = app.directory().as_ref();

        assert_eq!(sweep_unread_messages(directory, Utc::now()).await.unwrap(), 0);

        let later = Utc::now() + Duration::days(UNREAD_MESSAGE_RETENTION_DAYS + 1);
        assert_eq!(sweep_unread_messages(directory, later).await.unwrap(), 1);
        let left = directory.messages_for_matches(&[m.id]).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].content, "read");
    }

    #[tokio::test]
    async fn test_ended_call_sweep() {
        let app = TestApp::new().await;
        let (a, b, m) = app.matched_pair().await;
        let ended = calls::initiate_call(&app.state, a.id, m.id, CallType::Audio).await.unwrap();
        calls::reject_call(&app.state, b.id, ended.id).await.unwrap();
        calls::initiate_call(&app.state, a.id, m.id, CallType::Audio).await.unwrap();
        let directory = app.directory().as_ref();

        assert_eq!(sweep_ended_calls(directory, Utc::now()).await.unwrap(), 0);

        let later = Utc::now() + Duration::days(ENDED_CALL_RETENTION_DAYS + 1);
        assert_eq!(sweep_ended_calls(directory, later).await.unwrap(), 1);
        // The pending call survives
        let latest = directory.latest_call_for_match(m.id).await.unwrap().unwrap();
        assert_eq!(latest.status, CallStatus::Pending);
    }
}
