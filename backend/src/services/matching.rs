//! Swipe-to-match state transition and candidate discovery.

use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::constants::CANDIDATE_LIMIT;
use crate::db::StoreError;
use crate::error::{AppError, AppResult};
use crate::models::{Candidate, NotificationType, SwipeDirection};
use crate::realtime::ServerEvent;
use crate::state::AppState;

const NEW_MATCH_TEXT: &str = "You have a new match!";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeOutcome {
    pub swipe_id: Uuid,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<Uuid>,
}

pub async fn record_swipe(
    state: &AppState,
    actor: Uuid,
    target: Uuid,
    direction: SwipeDirection,
) -> AppResult<SwipeOutcome> {
    if actor == target {
        return Err(AppError::validation("Cannot swipe on yourself"));
    }
    let directory = &state.directory;
    if directory.get_user(target).await?.is_none() {
        return Err(AppError::not_found("Target user not found"));
    }

    let swipe = match directory.insert_swipe(actor, target, direction).await {
        Ok(swipe) => swipe,
        Err(StoreError::Duplicate(_)) => {
            return Err(AppError::conflict("Already swiped on this user"));
        }
        Err(e) => return Err(e.into()),
    };

    let mut outcome = SwipeOutcome {
        swipe_id: swipe.id,
        matched: false,
        match_id: None,
    };
    if direction != SwipeDirection::Like || !directory.has_liked(target, actor).await? {
        return Ok(outcome);
    }

    let created = match directory.insert_match(actor, target).await {
        Ok(created) => created,
        // The reciprocal like landed concurrently and already created the match
        Err(StoreError::Duplicate(_)) => {
            if let Some(existing) = directory.find_active_match_between(actor, target).await? {
                outcome.matched = true;
                outcome.match_id = Some(existing.id);
            }
            return Ok(outcome);
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!("💞 Match {} created between {} and {}", created.id, actor, target);

    for (recipient, other) in [(target, actor), (actor, target)] {
        state
            .notifier
            .create(
                recipient,
                NotificationType::NewMatch,
                NEW_MATCH_TEXT,
                json!({ "matchId": created.id }),
            )
            .await?;
        state
            .registry
            .send_to_user(
                recipient,
                ServerEvent::new(
                    "new_match",
                    json!({ "matchId": created.id, "matchedUserId": other }),
                ),
            )
            .await;
    }

    outcome.matched = true;
    outcome.match_id = Some(created.id);
    Ok(outcome)
}

/// Deletes the actor's swipe unless it already produced an active match.
pub async fn undo_swipe(state: &AppState, actor: Uuid, swipe_id: Uuid) -> AppResult<()> {
    let directory = &state.directory;
    let swipe = directory
        .find_swipe_by_owner(swipe_id, actor)
        .await?
        .ok_or_else(|| AppError::not_found("Swipe not found"))?;

    // A reciprocal like may land between the lookup and the delete, so the
    // match check happens inside the delete itself.
    if !directory.delete_swipe_unless_matched(swipe.id, actor).await? {
        return Err(AppError::conflict("Cannot undo a mutual match"));
    }
    Ok(())
}

pub async fn potential_matches(state: &AppState, user_id: Uuid) -> AppResult<Vec<Candidate>> {
    let user = state
        .directory
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(state.directory.find_candidates(&user, CANDIDATE_LIMIT).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProfileUpdate;
    use crate::testing::{drain, event_names, TestApp};

    #[tokio::test]
    async fn test_one_sided_like_does_not_match() {
        let app = TestApp::new().await;
        let (a, b) = (app.user("Ada").await, app.user("Bob").await);

        let outcome = record_swipe(&app.state, a.id, b.id, SwipeDirection::Like).await.unwrap();

        assert!(!outcome.matched);
        assert_eq!(outcome.match_id, None);
        assert!(app.directory().list_active_matches(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reciprocal_like_creates_exactly_one_match() {
        let app = TestApp::new().await;
        let (a, b) = (app.user("Ada").await, app.user("Bob").await);
        let (_, mut a_rx) = app.connect(a.id).await;
        let (_, mut b_rx) = app.connect(b.id).await;

        record_swipe(&app.state, b.id, a.id, SwipeDirection::Like).await.unwrap();
        let outcome = record_swipe(&app.state, a.id, b.id, SwipeDirection::Like).await.unwrap();

        assert!(outcome.matched);
        let matches = app.directory().list_active_matches(a.id).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(Some(matches[0].id), outcome.match_id);

        for rx in [&mut a_rx, &mut b_rx] {
            let events = drain(rx);
            let names = event_names(&events);
            assert_eq!(names.iter().filter(|n| **n == "new_match").count(), 1);
            assert_eq!(names.iter().filter(|n| **n == "new_notification").count(), 1);
        }
        assert_eq!(app.state.notifier.list(a.id, false).await.unwrap().len(), 1);
        assert_eq!(app.state.notifier.list(b.id, false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_second_swipe_on_same_target_conflicts() {
        let app = TestApp::new().await;
        let (a, b) = (app.user("Ada").await, app.user("Bob").await);

        record_swipe(&app.state, a.id, b.id, SwipeDirection::Pass).await.unwrap();
        let err = record_swipe(&app.state, a.id, b.id, SwipeDirection::Like)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_pass_and_swipe_up_never_match() {
        let app = TestApp::new().await;
        let (a, b, c) = (app.user("Ada").await, app.user("Bob").await, app.user("Cy").await);
        record_swipe(&app.state, b.id, a.id, SwipeDirection::Like).await.unwrap();
        record_swipe(&app.state, c.id, a.id, SwipeDirection::Like).await.unwrap();

        assert!(!record_swipe(&app.state, a.id, b.id, SwipeDirection::Pass).await.unwrap().matched);
        assert!(!record_swipe(&app.state, a.id, c.id, SwipeDirection::SwipeUp).await.unwrap().matched);
        assert!(app.directory().list_active_matches(a.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_self_and_unknown_targets_are_rejected() {
        let app = TestApp::new().await;
        let a = app.user("Ada").await;

        assert!(matches!(
            record_swipe(&app.state, a.id, a.id, SwipeDirection::Like).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            record_swipe(&app.state, a.id, Uuid::new_v4(), SwipeDirection::Like).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_undo_without_match_removes_swipe() {
        let app = TestApp::new().await;
        let (a, b) = (app.user("Ada").await, app.user("Bob").await);
        let outcome = record_swipe(&app.state, a.id, b.id, SwipeDirection::Like).await.unwrap();

        undo_swipe(&app.state, a.id, outcome.swipe_id).await.unwrap();

        assert!(app.directory().find_swipe(a.id, b.id).await.unwrap().is_none());
        // The pair can be swiped again
        record_swipe(&app.state, a.id, b.id, SwipeDirection::Pass).await.unwrap();
    }

    #[tokio::test]
    async fn test_undo_after_match_conflicts() {
        let app = TestApp::new().await;
        let (a, b) = (app.user("Ada").await, app.user("Bob").await);
        record_swipe(&app.state, b.id, a.id, SwipeDirection::Like).await.unwrap();
        let outcome = record_swipe(&app.state, a.id, b.id, SwipeDirection::Like).await.unwrap();

        let err = undo_swipe(&app.state, a.id, outcome.swipe_id).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert!(app.directory().find_swipe(a.id, b.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_undo_of_someone_elses_swipe_is_not_found() {
        let app = TestApp::new().await;
        let (a, b) = (app.user("Ada").await, app.user("Bob").await);
        let outcome = record_swipe(&app.state, a.id, b.id, SwipeDirection::Like).await.unwrap();

        assert!(matches!(
            undo_swipe(&app.state, b.id, outcome.swipe_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_candidates_exclude_self_swiped_and_unverified() {
        let app = TestApp::new().await;
        let me = app.user("Me").await;
        let swiped = app.user("Swiped").await;
        let fresh = app.user("Fresh").await;
        let unverified = app
            .directory()
            .create_user(crate::models::NewUser {
                email: "u@example.com".into(),
                password_hash: "x".into(),
                name: "Unverified".into(),
                age: 30,
                gender: "female".into(),
                verification_token: "tok".into(),
            })
            .await
            .unwrap();
        record_swipe(&app.state, me.id, swiped.id, SwipeDirection::Pass).await.unwrap();

        let ids: Vec<Uuid> = potential_matches(&app.state, me.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();

        assert_eq!(ids, vec![fresh.id]);
        assert!(!ids.contains(&unverified.id));
    }

    #[tokio::test]
    async fn test_candidates_respect_preferences_and_distance() {
        let app = TestApp::new().await;
        let dir = app.directory();
        let me = app.user("Me").await;
        let near = app.user("Near").await;
        let nearer = app.user("Nearer").await;
        let far = app.user("Far").await;
        let old = app.user("Old").await;

        let at = |lat: f64, lng: f64| ProfileUpdate {
            latitude: Some(lat),
            longitude: Some(lng),
            ..Default::default()
        };
        dir.update_profile(me.id, &ProfileUpdate {
            max_distance: Some(50.0),
            age_max: Some(40),
            seeking_gender: Some("female".into()),
            ..at(40.7128, -74.0060)
        })
        .await
        .unwrap();
        dir.update_profile(near.id, &at(40.7306, -73.9352)).await.unwrap(); // ~4 mi
        dir.update_profile(nearer.id, &at(40.7130, -74.0050)).await.unwrap();
        dir.update_profile(far.id, &at(34.0522, -118.2437)).await.unwrap(); // LA
        dir.update_profile(old.id, &ProfileUpdate { age: Some(60), ..at(40.7128, -74.0060) })
            .await
            .unwrap();

        let found = potential_matches(&app.state, me.id).await.unwrap();
        let ids: Vec<Uuid> = found.iter().map(|c| c.id).collect();

        assert_eq!(ids, vec![nearer.id, near.id]);
        assert!(found[0].distance_miles.unwrap() < found[1].distance_miles.unwrap());
    }
}
