use crate::db::StoreResult;
use crate::models::Match;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert_match(pool: &PgPool, user_a: Uuid, user_b: Uuid) -> StoreResult<Match> {
    let created = sqlx::query_as::<_, Match>(
        r#"
        INSERT INTO matches (id, user1_id, user2_id)
        VALUES ($1, $2, $3)
        RETURNING id, user1_id, user2_id, is_active, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_a)
    .bind(user_b)
    .fetch_one(pool)
    .await?;

    Ok(created)
}

pub async fn get_active_match_between(pool: &PgPool, user_a: Uuid, user_b: Uuid) -> StoreResult<Option<Match>> {
    let found = sqlx::query_as::<_, Match>(
        r#"
        SELECT id, user1_id, user2_id, is_active, created_at
        FROM matches
        WHERE is_active = TRUE
        AND ((user1_id = $1 AND user2_id = $2) OR (user1_id = $2 AND user2_id = $1))
        "#,
    )
    .bind(user_a)
    .bind(user_b)
    .fetch_optional(pool)
    .await?;

    Ok(found)
}

pub async fn get_active_match_for(pool: &PgPool, match_id: Uuid, participant: Uuid) -> StoreResult<Option<Match>> {
    let found = sqlx::query_as::<_, Match>(
        r#"
        SELECT id, user1_id, user2_id, is_active, created_at
        FROM matches
        WHERE id = $1 AND is_active = TRUE AND (user1_id = $2 OR user2_id = $2)
        "#,
    )
    .bind(match_id)
    .bind(participant)
    .fetch_optional(pool)
    .await?;

    Ok(found)
}

pub async fn list_active_matches(pool: &PgPool, user_id: Uuid) -> StoreResult<Vec<Match>> {
    let matches = sqlx::query_as::<_, Match>(
        r#"
        SELECT id, user1_id, user2_id, is_active, created_at
        FROM matches
        WHERE is_active = TRUE AND (user1_id = $1 OR user2_id = $1)
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(matches)
}

pub async fn deactivate_match(pool: &PgPool, match_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("UPDATE matches SET is_active = FALSE WHERE id = $1 AND is_active = TRUE")
        .bind(match_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
