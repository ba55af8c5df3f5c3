use crate::db::StoreResult;
use crate::models::{Swipe, SwipeDirection};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert_swipe(
    pool: &PgPool,
    actor: Uuid,
    target: Uuid,
    direction: SwipeDirection,
) -> StoreResult<Swipe> {
    let swipe = sqlx::query_as::<_, Swipe>(
        r#"
        INSERT INTO swipes (id, user_id, target_id, direction)
        VALUES ($1, $2, $3, $4)
        RETURNING id, user_id, target_id, direction, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(actor)
    .bind(target)
    .bind(direction)
    .fetch_one(pool)
    .await?;

    Ok(swipe)
}

pub async fn get_swipe(pool: &PgPool, actor: Uuid, target: Uuid) -> StoreResult<Option<Swipe>> {
    let swipe = sqlx::query_as::<_, Swipe>(
        r#"
        SELECT id, user_id, target_id, direction, created_at
        FROM swipes
        WHERE user_id = $1 AND target_id = $2
        "#,
    )
    .bind(actor)
    .bind(target)
    .fetch_optional(pool)
    .await?;

    Ok(swipe)
}

pub async fn has_liked(pool: &PgPool, actor: Uuid, target: Uuid) -> StoreResult<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM swipes WHERE user_id = $1 AND target_id = $2 AND direction = 'like')",
    )
    .bind(actor)
    .bind(target)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

pub async fn get_swipe_by_owner(pool: &PgPool, swipe_id: Uuid, actor: Uuid) -> StoreResult<Option<Swipe>> {
    let swipe = sqlx::query_as::<_, Swipe>(
        r#"
        SELECT id, user_id, target_id, direction, created_at
        FROM swipes
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(swipe_id)
    .bind(actor)
    .fetch_optional(pool)
    .await?;

    Ok(swipe)
}

pub async fn delete_swipe_unless_matched(pool: &PgPool, swipe_id: Uuid, actor: Uuid) -> StoreResult<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM swipes s
        WHERE s.id = $1 AND s.user_id = $2
        AND NOT EXISTS (
            SELECT 1 FROM matches m
            WHERE m.is_active
            AND ((m.user1_id = $2 AND m.user2_id = s.target_id)
                OR (m.user1_id = s.target_id AND m.user2_id = $2))
        )
        "#,
    )
    .bind(swipe_id)
    .bind(actor)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
