use crate::db::StoreResult;
use crate::models::Message;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert_message(
    pool: &PgPool,
    match_id: Uuid,
    sender: Uuid,
    content: &str,
    is_image: bool,
) -> StoreResult<Message> {
    let message = sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages (id, match_id, sender_id, content, is_image)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, match_id, sender_id, content, is_image, read_status, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(match_id)
    .bind(sender)
    .bind(content)
    .bind(is_image)
    .fetch_one(pool)
    .await?;

    Ok(message)
}

pub async fn get_message(pool: &PgPool, message_id: Uuid) -> StoreResult<Option<Message>> {
    let message = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, match_id, sender_id, content, is_image, read_status, created_at
        FROM messages
        WHERE id = $1
        "#,
    )
    .bind(message_id)
    .fetch_optional(pool)
    .await?;

    Ok(message)
}

pub async fn mark_messages_read(pool: &PgPool, match_id: Uuid, reader: Uuid) -> StoreResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET read_status = TRUE
        WHERE match_id = $1 AND sender_id <> $2 AND read_status = FALSE
        "#,
    )
    .bind(match_id)
    .bind(reader)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

pub async fn mark_message_read(pool: &PgPool, message_id: Uuid, match_id: Uuid, reader: Uuid) -> StoreResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE messages
        SET read_status = TRUE
        WHERE id = $1 AND match_id = $2 AND sender_id <> $3 AND read_status = FALSE
        "#,
    )
    .bind(message_id)
    .bind(match_id)
    .bind(reader)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn get_messages_page_desc(
    pool: &PgPool,
    match_id: Uuid,
    offset: i64,
    limit: i64,
) -> StoreResult<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, match_id, sender_id, content, is_image, read_status, created_at
        FROM messages
        WHERE match_id = $1
        ORDER BY created_at DESC, seq DESC
        OFFSET $2
        LIMIT $3
        "#,
    )
    .bind(match_id)
    .bind(offset)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

pub async fn get_messages_for_matches(pool: &PgPool, match_ids: &[Uuid]) -> StoreResult<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, match_id, sender_id, content, is_image, read_status, created_at
        FROM messages
        WHERE match_id = ANY($1)
        ORDER BY created_at ASC, seq ASC
        "#,
    )
    .bind(match_ids)
    .fetch_all(pool)
    .await?;

    Ok(messages)
}

pub async fn get_last_message(pool: &PgPool, match_id: Uuid) -> StoreResult<Option<Message>> {
    let message = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, match_id, sender_id, content, is_image, read_status, created_at
        FROM messages
        WHERE match_id = $1
        ORDER BY created_at DESC, seq DESC
        LIMIT 1
        "#,
    )
    .bind(match_id)
    .fetch_optional(pool)
    .await?;

    Ok(message)
}

pub async fn count_unread(pool: &PgPool, match_id: Uuid, reader: Uuid) -> StoreResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM messages WHERE match_id = $1 AND sender_id <> $2 AND read_status = FALSE",
    )
    .bind(match_id)
    .bind(reader)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

pub async fn delete_message(pool: &PgPool, message_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM messages WHERE id = $1")
        .bind(message_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_messages_for_match(pool: &PgPool, match_id: Uuid) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM messages WHERE match_id = $1")
        .bind(match_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

pub async fn delete_unread_messages_before(pool: &PgPool, cutoff: DateTime<Utc>) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM messages WHERE read_status = FALSE AND created_at < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
