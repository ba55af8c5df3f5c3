//! Store boundary shared by every service.
//!
//! State transitions (call accept/reject/end, match deactivation, confession
//! claim, photo append) are single conditional operations: implementations
//! must apply them atomically and report whether the precondition held.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Call, CallType, Candidate, Confession, Match, Message, NewUser, Notification,
    NotificationType, Photo, ProfileUpdate, Swipe, SwipeDirection, User,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness invariant rejected the write
    #[error("duplicate {0}")]
    Duplicate(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Duplicate(duplicate_label(db_err.constraint()).to_string());
            }
        }
        StoreError::Backend(err.into())
    }
}

fn duplicate_label(constraint: Option<&str>) -> &'static str {
    match constraint {
        Some("users_email_unique") => "email",
        Some("swipes_actor_target_unique") => "swipe",
        Some("matches_active_pair_unique") => "match",
        Some("calls_in_flight_unique") => "call",
        _ => "record",
    }
}

#[async_trait]
pub trait Directory: Send + Sync {
    // Users
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User>;
    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>>;
    /// Case-insensitive lookup
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// Marks the token's owner verified and consumes the token.
    async fn verify_user_by_token(&self, token: &str) -> StoreResult<Option<User>>;
    async fn mark_user_verified(&self, user_id: Uuid) -> StoreResult<bool>;
    async fn set_reset_token(
        &self,
        user_id: Uuid,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;
    /// Replaces the password when `token` exists and has not expired at `now`.
    async fn reset_password_by_token(
        &self,
        token: &str,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> StoreResult<bool>;
    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> StoreResult<()>;
    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> StoreResult<Option<User>>;
    /// Appends unless the profile already holds `max_photos`.
    async fn append_photo(&self, user_id: Uuid, photo: Photo, max_photos: usize) -> StoreResult<bool>;
    async fn remove_photo(&self, user_id: Uuid, photo_id: Uuid) -> StoreResult<bool>;
    async fn set_selfie(&self, user_id: Uuid, url: &str) -> StoreResult<bool>;
    /// Removes the user together with every dependent record.
    async fn delete_user(&self, user_id: Uuid) -> StoreResult<bool>;
    /// Verified, unswiped users matching the requester's preferences,
    /// nearest first when the requester has a location.
    async fn find_candidates(&self, requester: &User, limit: i64) -> StoreResult<Vec<Candidate>>;

    // Swipes
    async fn insert_swipe(
        &self,
        actor: Uuid,
        target: Uuid,
        direction: SwipeDirection,
    ) -> StoreResult<Swipe>;
    async fn find_swipe(&self, actor: Uuid, target: Uuid) -> StoreResult<Option<Swipe>>;
    async fn has_liked(&self, actor: Uuid, target: Uuid) -> StoreResult<bool>;
    async fn find_swipe_by_owner(&self, swipe_id: Uuid, actor: Uuid) -> StoreResult<Option<Swipe>>;
    /// Deletes the actor's swipe unless an active match exists between the
    /// actor and its target; checked and applied as one operation.
    async fn delete_swipe_unless_matched(&self, swipe_id: Uuid, actor: Uuid) -> StoreResult<bool>;

    // Matches
    async fn insert_match(&self, user_a: Uuid, user_b: Uuid) -> StoreResult<Match>;
    /// Either storage order
    async fn find_active_match_between(&self, user_a: Uuid, user_b: Uuid) -> StoreResult<Option<Match>>;
    async fn find_active_match_for(&self, match_id: Uuid, participant: Uuid) -> StoreResult<Option<Match>>;
    async fn list_active_matches(&self, user_id: Uuid) -> StoreResult<Vec<Match>>;
    async fn deactivate_match(&self, match_id: Uuid) -> StoreResult<bool>;

    // Messages
    async fn insert_message(
        &self,
        match_id: Uuid,
        sender: Uuid,
        content: &str,
        is_image: bool,
    ) -> StoreResult<Message>;
    async fn get_message(&self, message_id: Uuid) -> StoreResult<Option<Message>>;
    /// Marks every message in the match not sent by `reader` as read.
    async fn mark_messages_read(&self, match_id: Uuid, reader: Uuid) -> StoreResult<u64>;
    async fn mark_message_read(&self, message_id: Uuid, match_id: Uuid, reader: Uuid) -> StoreResult<bool>;
    /// Newest first
    async fn messages_page_desc(&self, match_id: Uuid, offset: i64, limit: i64) -> StoreResult<Vec<Message>>;
    /// Oldest first
    async fn messages_for_matches(&self, match_ids: &[Uuid]) -> StoreResult<Vec<Message>>;
    async fn last_message(&self, match_id: Uuid) -> StoreResult<Option<Message>>;
    async fn count_unread(&self, match_id: Uuid, reader: Uuid) -> StoreResult<i64>;
    async fn delete_message(&self, message_id: Uuid) -> StoreResult<bool>;
    async fn delete_messages_for_match(&self, match_id: Uuid) -> StoreResult<u64>;
    async fn delete_unread_messages_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;

    // Calls
    async fn insert_call(
        &self,
        match_id: Uuid,
        initiator: Uuid,
        receiver: Uuid,
        call_type: CallType,
    ) -> StoreResult<Call>;
    /// pending -> active, receiver only
    async fn accept_call(&self, call_id: Uuid, receiver: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Call>>;
    /// pending -> ended, receiver only
    async fn reject_call(&self, call_id: Uuid, receiver: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Call>>;
    /// pending|active -> ended, initiator only; backfills start time
    async fn end_call(&self, call_id: Uuid, initiator: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Call>>;
    async fn latest_call_for_match(&self, match_id: Uuid) -> StoreResult<Option<Call>>;
    /// pending calls created before `created_before` -> ended
    async fn expire_pending_calls(
        &self,
        created_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Call>>;
    async fn delete_ended_calls_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;

    // Confessions
    async fn insert_confession(&self, sender: Uuid, content: &str) -> StoreResult<Confession>;
    /// Assigns the oldest unassigned confession not sent by `requester`.
    async fn claim_confession(&self, requester: Uuid) -> StoreResult<Option<Confession>>;

    // Notifications
    async fn insert_notification(
        &self,
        recipient: Uuid,
        notification_type: NotificationType,
        content: &str,
        metadata: serde_json::Value,
    ) -> StoreResult<Notification>;
    /// Newest first
    async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> StoreResult<Vec<Notification>>;
    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> StoreResult<bool>;
    async fn clear_notifications(&self, user_id: Uuid) -> StoreResult<u64>;
}
