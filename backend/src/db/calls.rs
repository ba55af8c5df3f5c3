use crate::db::StoreResult;
use crate::models::{Call, CallType};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert_call(
    pool: &PgPool,
    match_id: Uuid,
    initiator: Uuid,
    receiver: Uuid,
    call_type: CallType,
) -> StoreResult<Call> {
    let call = sqlx::query_as::<_, Call>(
        r#"
        INSERT INTO calls (id, match_id, initiator_id, receiver_id, call_type, status)
        VALUES ($1, $2, $3, $4, $5, 'pending')
        RETURNING id, match_id, initiator_id, receiver_id, call_type, status, start_time, end_time, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(match_id)
    .bind(initiator)
    .bind(receiver)
    .bind(call_type)
    .fetch_one(pool)
    .await?;

    Ok(call)
}

// Transitions are single conditional updates; a `None` result means the
// call was missing, in the wrong state, or not addressed to the caller.

pub async fn accept_call(pool: &PgPool, call_id: Uuid, receiver: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Call>> {
    let call = sqlx::query_as::<_, Call>(
        r#"
        UPDATE calls
        SET status = 'active', start_time = $3
        WHERE id = $1 AND receiver_id = $2 AND status = 'pending'
        RETURNING id, match_id, initiator_id, receiver_id, call_type, status, start_time, end_time, created_at
        "#,
    )
    .bind(call_id)
    .bind(receiver)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(call)
}

pub async fn reject_call(pool: &PgPool, call_id: Uuid, receiver: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Call>> {
    let call = sqlx::query_as::<_, Call>(
        r#"
        UPDATE calls
        SET status = 'ended', end_time = $3
        WHERE id = $1 AND receiver_id = $2 AND status = 'pending'
        RETURNING id, match_id, initiator_id, receiver_id, call_type, status, start_time, end_time, created_at
        "#,
    )
    .bind(call_id)
    .bind(receiver)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(call)
}

pub async fn end_call(pool: &PgPool, call_id: Uuid, initiator: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Call>> {
    let call = sqlx::query_as::<_, Call>(
        r#"
        UPDATE calls
        SET status = 'ended', end_time = $3, start_time = COALESCE(start_time, created_at)
        WHERE id = $1 AND initiator_id = $2 AND status IN ('pending', 'active')
        RETURNING id, match_id, initiator_id, receiver_id, call_type, status, start_time, end_time, created_at
        "#,
    )
    .bind(call_id)
    .bind(initiator)
    .bind(now)
    .fetch_optional(pool)
    .await?;

    Ok(call)
}

pub async fn get_latest_call_for_match(pool: &PgPool, match_id: Uuid) -> StoreResult<Option<Call>> {
    let call = sqlx::query_as::<_, Call>(
        r#"
        SELECT id, match_id, initiator_id, receiver_id, call_type, status, start_time, end_time, created_at
        FROM calls
        WHERE match_id = $1
        ORDER BY created_at DESC
        LIMIT 1
        "#,
    )
    .bind(match_id)
    .fetch_optional(pool)
    .await?;

    Ok(call)
}

pub async fn expire_pending_calls(
    pool: &PgPool,
    created_before: DateTime<Utc>,
    now: DateTime<Utc>,
) -> StoreResult<Vec<Call>> {
    let calls = sqlx::query_as::<_, Call>(
        r#"
        UPDATE calls
        SET status = 'ended', end_time = $2
        WHERE status = 'pending' AND created_at < $1
        RETURNING id, match_id, initiator_id, receiver_id, call_type, status, start_time, end_time, created_at
        "#,
    )
    .bind(created_before)
    .bind(now)
    .fetch_all(pool)
    .await?;

    Ok(calls)
}

pub async fn delete_ended_calls_before(pool: &PgPool, cutoff: DateTime<Utc>) -> StoreResult<u64> {
    let result = sqlx::query("DELETE FROM calls WHERE status = 'ended' AND end_time < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
