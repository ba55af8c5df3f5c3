use serde_json::json;
use uuid::Uuid;

use crate::constants::MAX_CONFESSION_LENGTH;
use crate::error::{AppError, AppResult};
use crate::models::{Confession, NotificationType};
use crate::state::AppState;
use crate::utils::validation::bounded_text;

pub async fn send_confession(state: &AppState, sender: Uuid, content: &str) -> AppResult<Confession> {
    let content = bounded_text(content, "Confession", MAX_CONFESSION_LENGTH)?;
    Ok(state.directory.insert_confession(sender, &content).await?)
}

/// Hands the requester the oldest unclaimed confession someone else wrote.
/// A claimed confession is never handed out again.
pub async fn random_confession(state: &AppState, requester: Uuid) -> AppResult<Confession> {
    let confession = state
        .directory
        .claim_confession(requester)
        .await?
        .ok_or_else(|| AppError::not_found("No confessions available at this time"))?;

    state
        .notifier
        .create(
            requester,
            NotificationType::ConfessionReceived,
            "You received a new confession!",
            json!({ "confessionId": confession.id }),
        )
        .await?;

    Ok(confession)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestApp;

    #[tokio::test]
    async fn test_confessions_are_claimed_in_creation_order() {
        let app = TestApp::new().await;
        let (a, b, c) = (app.user("Ada").await, app.user("Bob").await, app.user("Cy").await);
        send_confession(&app.state, a.id, "first").await.unwrap();
        send_confession(&app.state, a.id, "second").await.unwrap();

        assert_eq!(random_confession(&app.state, b.id).await.unwrap().content, "first");
        assert_eq!(random_confession(&app.state, c.id).await.unwrap().content, "second");
        assert!(matches!(
            random_confession(&app.state, b.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_sender_never_receives_own_confession() {
        let app = TestApp::new().await;
        let a = app.user("Ada").await;
        send_confession(&app.state, a.id, "mine").await.unwrap();

        assert!(matches!(
            random_confession(&app.state, a.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_claim_records_recipient_and_notifies() {
        let app = TestApp::new().await;
        let (a, b) = (app.user("Ada").await, app.user("Bob").await);
        send_confession(&app.state, a.id, "psst").await.unwrap();

        let claimed = random_confession(&app.state, b.id).await.unwrap();

        assert_eq!(claimed.delivered_to, Some(b.id));
        let notes = app.state.notifier.list(b.id, false).await.unwrap();
        assert_eq!(notes[0].notification_type, NotificationType::ConfessionReceived);
    }

    #[tokio::test]
    async fn test_confession_length_is_bounded() {
        let app = TestApp::new().await;
        let a = app.user("Ada").await;
        assert!(send_confession(&app.state, a.id, "").await.is_err());
        let long = "x".repeat(MAX_CONFESSION_LENGTH + 1);
        assert!(send_confession(&app.state, a.id, &long).await.is_err());
    }
}
