use crate::db::StoreResult;
use crate::models::Confession;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert_confession(pool: &PgPool, sender: Uuid, content: &str) -> StoreResult<Confession> {
    let confession = sqlx::query_as::<_, Confession>(
        r#"
        INSERT INTO confessions (id, content, anonymous_id)
        VALUES ($1, $2, $3)
        RETURNING id, content, anonymous_id, delivered_to, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(content)
    .bind(sender)
    .fetch_one(pool)
    .await?;

    Ok(confession)
}

/// FIFO claim; `SKIP LOCKED` keeps two concurrent requesters from
/// receiving the same confession.
pub async fn claim_confession(pool: &PgPool, requester: Uuid) -> StoreResult<Option<Confession>> {
    let confession = sqlx::query_as::<_, Confession>(
        r#"
        UPDATE confessions
        SET delivered_to = $1
        WHERE id = (
            SELECT id FROM confessions
            WHERE delivered_to IS NULL AND anonymous_id <> $1
            ORDER BY created_at ASC, seq ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
        )
        AND delivered_to IS NULL
        RETURNING id, content, anonymous_id, delivered_to, created_at
        "#,
    )
    .bind(requester)
    .fetch_optional(pool)
    .await?;

    Ok(confession)
}
