use crate::db::StoreResult;
use crate::models::{Notification, NotificationType};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

pub async fn insert_notification(
    pool: &PgPool,
    recipient: Uuid,
    notification_type: NotificationType,
    content: &str,
    metadata: serde_json::Value,
) -> StoreResult<Notification> {
    let notification = sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (id, user_id, type, content, metadata)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, user_id, type, content, metadata, read_status, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(recipient)
    .bind(notification_type)
    .bind(content)
    .bind(Json(metadata))
    .fetch_one(pool)
    .await?;

    Ok(notification)
}

pub async fn list_notifications(
    pool: &PgPool,
    user_id: Uuid,
    unread_only: bool,
    limit: i64,
) -> StoreResult<Vec<Notification>> {
    let notifications = sqlx::query_as::<_, Notification>(
        r#"
        SELECT id, user_id, type, content, metadata, read_status, created_at
        FROM notifications
        WHERE user_id = $1 AND ($2 = FALSE OR read_status = FALSE)
        ORDER BY created_at DESC
        LIMIT $3
        "#,
    )
    .bind(user_id)
    .bind(unread_only)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(notifications)
}

pub async fn mark_notification_read(pool: &PgPool, notification_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("UPDATE notifications SET read_status = TRUE WHERE id = $1 AND user_id = $2")
        .bind(notification_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn clear_notifications(pool: &PgPool, user_id: Uuid) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
