use crate::constants::{EARTH_RADIUS_METERS, METERS_PER_MILE};
use crate::db::StoreResult;
use crate::models::{Candidate, NewUser, Photo, ProfileUpdate, User};
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

const USER_COLUMNS: &str = r#"
    id, email, password_hash, name, age, gender, bio, relationship_type, photos, selfie,
    is_verified, verification_token, reset_password_token, reset_password_expires,
    pref_age_min, pref_age_max, pref_max_distance, pref_seeking_gender, pref_relationship_type,
    latitude, longitude, created_at, updated_at
"#;

// User operations
pub async fn create_user(pool: &PgPool, new_user: NewUser) -> StoreResult<User> {
    let sql = format!(
        r#"
        INSERT INTO users (id, email, password_hash, name, age, gender, verification_token)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {USER_COLUMNS}
        "#
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(Uuid::new_v4())
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.name)
        .bind(new_user.age)
        .bind(&new_user.gender)
        .bind(&new_user.verification_token)
        .fetch_one(pool)
        .await?;

    Ok(user)
}

pub async fn get_user_by_id(pool: &PgPool, user_id: Uuid) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn get_user_by_email(pool: &PgPool, email: &str) -> StoreResult<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn verify_user_by_token(pool: &PgPool, token: &str) -> StoreResult<Option<User>> {
    let sql = format!(
        r#"
        UPDATE users
        SET is_verified = TRUE, verification_token = NULL, updated_at = NOW()
        WHERE verification_token = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(token)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn mark_user_verified(pool: &PgPool, user_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query(
        "UPDATE users SET is_verified = TRUE, verification_token = NULL, updated_at = NOW() WHERE id = $1",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_reset_token(
    pool: &PgPool,
    user_id: Uuid,
    token: &str,
    expires_at: DateTime<Utc>,
) -> StoreResult<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET reset_password_token = $2, reset_password_expires = $3, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(token)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn reset_password_by_token(
    pool: &PgPool,
    token: &str,
    password_hash: &str,
    now: DateTime<Utc>,
) -> StoreResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $2, reset_password_token = NULL, reset_password_expires = NULL, updated_at = NOW()
        WHERE reset_password_token = $1 AND reset_password_expires > $3
        "#,
    )
    .bind(token)
    .bind(password_hash)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_password(pool: &PgPool, user_id: Uuid, password_hash: &str) -> StoreResult<()> {
    sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(password_hash)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn update_profile(
    pool: &PgPool,
    user_id: Uuid,
    update: &ProfileUpdate,
) -> StoreResult<Option<User>> {
    let sql = format!(
        r#"
        UPDATE users SET
            name = COALESCE($2, name),
            age = COALESCE($3, age),
            gender = COALESCE($4, gender),
            bio = COALESCE($5, bio),
            relationship_type = COALESCE($6, relationship_type),
            pref_age_min = COALESCE($7, pref_age_min),
            pref_age_max = COALESCE($8, pref_age_max),
            pref_max_distance = COALESCE($9, pref_max_distance),
            pref_seeking_gender = COALESCE($10, pref_seeking_gender),
            pref_relationship_type = COALESCE($11, pref_relationship_type),
            latitude = COALESCE($12, latitude),
            longitude = COALESCE($13, longitude),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {USER_COLUMNS}
        "#
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(user_id)
        .bind(&update.name)
        .bind(update.age)
        .bind(&update.gender)
        .bind(&update.bio)
        .bind(&update.relationship_type)
        .bind(update.age_min)
        .bind(update.age_max)
        .bind(update.max_distance)
        .bind(&update.seeking_gender)
        .bind(&update.seeking_relationship_type)
        .bind(update.latitude)
        .bind(update.longitude)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn append_photo(
    pool: &PgPool,
    user_id: Uuid,
    photo: Photo,
    max_photos: usize,
) -> StoreResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET photos = photos || jsonb_build_array($2::jsonb), updated_at = NOW()
        WHERE id = $1 AND jsonb_array_length(photos) < $3
        "#,
    )
    .bind(user_id)
    .bind(Json(photo))
    .bind(max_photos as i32)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn remove_photo(pool: &PgPool, user_id: Uuid, photo_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE users
        SET photos = COALESCE(
                (SELECT jsonb_agg(p) FROM jsonb_array_elements(photos) p WHERE p->>'id' <> $2::text),
                '[]'::jsonb
            ),
            updated_at = NOW()
        WHERE id = $1
        AND EXISTS (SELECT 1 FROM jsonb_array_elements(photos) p WHERE p->>'id' = $2::text)
        "#,
    )
    .bind(user_id)
    .bind(photo_id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn set_selfie(pool: &PgPool, user_id: Uuid, url: &str) -> StoreResult<bool> {
    let result = sqlx::query("UPDATE users SET selfie = $2, updated_at = NOW() WHERE id = $1")
        .bind(user_id)
        .bind(url)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Dependent rows go with the user through `ON DELETE CASCADE`.
pub async fn delete_user(pool: &PgPool, user_id: Uuid) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[derive(Debug, FromRow)]
struct CandidateRow {
    id: Uuid,
    name: String,
    age: i32,
    gender: String,
    bio: String,
    photos: Json<Vec<Photo>>,
    distance_meters: Option<f64>,
}

impl From<CandidateRow> for Candidate {
    fn from(row: CandidateRow) -> Self {
        Candidate {
            id: row.id,
            name: row.name,
            age: row.age,
            gender: row.gender,
            bio: row.bio,
            photos: row.photos.0,
            distance_miles: row.distance_meters.map(|m| m / METERS_PER_MILE),
        }
    }
}

pub async fn find_candidates(pool: &PgPool, requester: &User, limit: i64) -> StoreResult<Vec<Candidate>> {
    let prefs = &requester.filter_preferences;
    let origin = requester.location.coordinates();

    // Without an origin every candidate qualifies and distance stays NULL.
    let rows = sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT id, name, age, gender, bio, photos, distance_meters FROM (
            SELECT u.id, u.name, u.age, u.gender, u.bio, u.photos, u.created_at,
                CASE WHEN $6::float8 IS NULL OR u.latitude IS NULL OR u.longitude IS NULL THEN NULL
                ELSE 2 * $9::float8 * ASIN(SQRT(
                    POWER(SIN(RADIANS(u.latitude - $6) / 2), 2)
                    + COS(RADIANS($6)) * COS(RADIANS(u.latitude))
                    * POWER(SIN(RADIANS(u.longitude - $7) / 2), 2)
                )) END AS distance_meters
            FROM users u
            WHERE u.id <> $1
            AND u.is_verified = TRUE
            AND u.age BETWEEN $2 AND $3
            AND ($4 = 'any' OR u.gender = $4)
            AND ($5 = 'any' OR u.relationship_type = $5)
            AND NOT EXISTS (SELECT 1 FROM swipes s WHERE s.user_id = $1 AND s.target_id = u.id)
        ) c
        WHERE $6::float8 IS NULL OR distance_meters <= $8
        ORDER BY distance_meters ASC NULLS LAST, created_at ASC, id ASC
        LIMIT $10
        "#,
    )
    .bind(requester.id)
    .bind(prefs.age_min)
    .bind(prefs.age_max)
    .bind(&prefs.seeking_gender)
    .bind(&prefs.relationship_type)
    .bind(origin.map(|(lat, _)| lat))
    .bind(origin.map(|(_, lng)| lng))
    .bind(prefs.max_distance * METERS_PER_MILE)
    .bind(EARTH_RADIUS_METERS)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Candidate::from).collect())
}
