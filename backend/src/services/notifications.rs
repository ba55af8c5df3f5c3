//! Durable notifications with a live push to the recipient.

use std::sync::Arc;

use uuid::Uuid;

use crate::constants::NOTIFICATION_LIST_LIMIT;
use crate::db::Directory;
use crate::error::{AppError, AppResult};
use crate::models::{Notification, NotificationType};
use crate::realtime::{ConnectionRegistry, ServerEvent};

#[derive(Clone)]
pub struct Notifier {
    directory: Arc<dyn Directory>,
    registry: ConnectionRegistry,
}

impl Notifier {
    pub fn new(directory: Arc<dyn Directory>, registry: ConnectionRegistry) -> Self {
        Self { directory, registry }
    }

    /// Persists the notification, then pushes `new_notification` to every
    /// live connection of the recipient.
    pub async fn create(
        &self,
        recipient: Uuid,
        notification_type: NotificationType,
        content: &str,
        metadata: serde_json::Value,
    ) -> AppResult<Notification> {
        let notification = self
            .directory
            .insert_notification(recipient, notification_type, content, metadata)
            .await?;

        let payload = serde_json::to_value(&notification)
            .map_err(|e| AppError::Internal(e.into()))?;
        self.registry
            .send_to_user(recipient, ServerEvent::new("new_notification", payload))
            .await;

        Ok(notification)
    }

    pub async fn list(&self, user_id: Uuid, unread_only: bool) -> AppResult<Vec<Notification>> {
        Ok(self
            .directory
            .list_notifications(user_id, unread_only, NOTIFICATION_LIST_LIMIT)
            .await?)
    }

    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<()> {
        if !self
            .directory
            .mark_notification_read(notification_id, user_id)
            .await?
        {
            return Err(AppError::not_found("Notification not found"));
        }
        Ok(())
    }

    pub async fn clear_all(&self, user_id: Uuid) -> AppResult<u64> {
        Ok(self.directory.clear_notifications(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{drain, TestApp};
    use serde_json::json;

    #[tokio::test]
    async fn test_create_persists_and_pushes() {
        let app = TestApp::new().await;
        let user = app.user("Ada").await;
        let (_, mut rx) = app.connect(user.id).await;

        let created = app
            .state
            .notifier
            .create(user.id, NotificationType::NewMatch, "You have a new match!", json!({"matchId": "m"}))
            .await
            .unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event, "new_notification");
        assert_eq!(events[0].data["id"], json!(created.id));
        assert_eq!(events[0].data["type"], "new_match");

        let listed = app.state.notifier.list(user.id, false).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn test_create_for_offline_user_still_persists() {
        let app = TestApp::new().await;
        let user = app.user("Ada").await;

        app.state
            .notifier
            .create(user.id, NotificationType::NewMessage, "You have a new message!", json!({}))
            .await
            .unwrap();

        assert_eq!(app.state.notifier.list(user.id, true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_mark_read_is_recipient_scoped() {
        let app = TestApp::new().await;
        let owner = app.user("Ada").await;
        let other = app.user("Bob").await;
        let notifier = &app.state.notifier;
        let n = notifier
            .create(owner.id, NotificationType::NewMessage, "x", json!({}))
            .await
            .unwrap();

        assert!(matches!(
            notifier.mark_read(other.id, n.id).await,
            Err(AppError::NotFound(_))
        ));
        notifier.mark_read(owner.id, n.id).await.unwrap();

        assert!(notifier.list(owner.id, true).await.unwrap().is_empty());
        assert_eq!(notifier.list(owner.id, false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_clear_all_only_touches_caller() {
        let app = TestApp::new().await;
        let (a, b) = (app.user("Ada").await, app.user("Bob").await);
        let notifier = &app.state.notifier;
        for user in [a.id, a.id, b.id] {
            notifier
                .create(user, NotificationType::NewMessage, "x", json!({}))
                .await
                .unwrap();
        }

        assert_eq!(notifier.clear_all(a.id).await.unwrap(), 2);
        assert!(notifier.list(a.id, false).await.unwrap().is_empty());
        assert_eq!(notifier.list(b.id, false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_is_newest_first_and_capped() {
        let app = TestApp::new().await;
        let user = app.user("Ada").await;
        for i in 0..(NOTIFICATION_LIST_LIMIT + 5) {
            app.state
                .notifier
                .create(user.id, NotificationType::NewMessage, &format!("n{}", i), json!({}))
                .await
                .unwrap();
        }

        let listed = app.state.notifier.list(user.id, false).await.unwrap();
        assert_eq!(listed.len() as i64, NOTIFICATION_LIST_LIMIT);
        assert_eq!(listed[0].content, format!("n{}", NOTIFICATION_LIST_LIMIT + 4));
    }
}
