use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{calls, confessions, matches, messages, notifications, swipes, users};
use crate::db::{Directory, StoreResult};
use crate::models::{
    Call, CallType, Candidate, Confession, Match, Message, NewUser, Notification,
    NotificationType, Photo, ProfileUpdate, Swipe, SwipeDirection, User,
};

/// Postgres-backed directory; every method delegates to the query modules.
#[derive(Debug, Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        users::create_user(&self.pool, new_user).await
    }

    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        users::get_user_by_id(&self.pool, user_id).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        users::get_user_by_email(&self.pool, email).await
    }

    async fn verify_user_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        users::verify_user_by_token(&self.pool, token).await
    }

    async fn mark_user_verified(&self, user_id: Uuid) -> StoreResult<bool> {
        users::mark_user_verified(&self.pool, user_id).await
    }

    async fn set_reset_token(&self, user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        users::set_reset_token(&self.pool, user_id, token, expires_at).await
    }

    async fn reset_password_by_token(&self, token: &str, password_hash: &str, now: DateTime<Utc>) -> StoreResult<bool> {
        users::reset_password_by_token(&self.pool, token, password_hash, now).await
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> StoreResult<()> {
        users::update_password(&self.pool, user_id, password_hash).await
    }

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> StoreResult<Option<User>> {
        users::update_profile(&self.pool, user_id, update).await
    }

    async fn append_photo(&self, user_id: Uuid, photo: Photo, max_photos: usize) -> StoreResult<bool> {
        users::append_photo(&self.pool, user_id, photo, max_photos).await
    }

    async fn remove_photo(&self, user_id: Uuid, photo_id: Uuid) -> StoreResult<bool> {
        users::remove_photo(&self.pool, user_id, photo_id).await
    }

    async fn set_selfie(&self, user_id: Uuid, url: &str) -> StoreResult<bool> {
        users::set_selfie(&self.pool, user_id, url).await
    }

    async fn delete_user(&self, user_id: Uuid) -> StoreResult<bool> {
        users::delete_user(&self.pool, user_id).await
    }

    async fn find_candidates(&self, requester: &User, limit: i64) -> StoreResult<Vec<Candidate>> {
        users::find_candidates(&self.pool, requester, limit).await
    }

    async fn insert_swipe(&self, actor: Uuid, target: Uuid, direction: SwipeDirection) -> StoreResult<Swipe> {
        swipes::insert_swipe(&self.pool, actor, target, direction).await
    }

    async fn find_swipe(&self, actor: Uuid, target: Uuid) -> StoreResult<Option<Swipe>> {
        swipes::get_swipe(&self.pool, actor, target).await
    }

    async fn has_liked(&self, actor: Uuid, target: Uuid) -> StoreResult<bool> {
        swipes::has_liked(&self.pool, actor, target).await
    }

    async fn find_swipe_by_owner(&self, swipe_id: Uuid, actor: Uuid) -> StoreResult<Option<Swipe>> {
        swipes::get_swipe_by_owner(&self.pool, swipe_id, actor).await
    }

    async fn delete_swipe_unless_matched(&self, swipe_id: Uuid, actor: Uuid) -> StoreResult<bool> {
        swipes::delete_swipe_unless_matched(&self.pool, swipe_id, actor).await
    }

    async fn insert_match(&self, user_a: Uuid, user_b: Uuid) -> StoreResult<Match> {
        matches::insert_match(&self.pool, user_a, user_b).await
    }

    async fn find_active_match_between(&self, user_a: Uuid, user_b: Uuid) -> StoreResult<Option<Match>> {
        matches::get_active_match_between(&self.pool, user_a, user_b).await
    }

    async fn find_active_match_for(&self, match_id: Uuid, participant: Uuid) -> StoreResult<Option<Match>> {
        matches::get_active_match_for(&self.pool, match_id, participant).await
    }

    async fn list_active_matches(&self, user_id: Uuid) -> StoreResult<Vec<Match>> {
        matches::list_active_matches(&self.pool, user_id).await
    }

    async fn deactivate_match(&self, match_id: Uuid) -> StoreResult<bool> {
        matches::deactivate_match(&self.pool, match_id).await
    }

    async fn insert_message(&self, match_id: Uuid, sender: Uuid, content: &str, is_image: bool) -> StoreResult<Message> {
        messages::insert_message(&self.pool, match_id, sender, content, is_image).await
    }

    async fn get_message(&self, message_id: Uuid) -> StoreResult<Option<Message>> {
        messages::get_message(&self.pool, message_id).await
    }

    async fn mark_messages_read(&self, match_id: Uuid, reader: Uuid) -> StoreResult<u64> {
        messages::mark_messages_read(&self.pool, match_id, reader).await
    }

    async fn mark_message_read(&self, message_id: Uuid, match_id: Uuid, reader: Uuid) -> StoreResult<bool> {
        messages::mark_message_read(&self.pool, message_id, match_id, reader).await
    }

    async fn messages_page_desc(&self, match_id: Uuid, offset: i64, limit: i64) -> StoreResult<Vec<Message>> {
        messages::get_messages_page_desc(&self.pool, match_id, offset, limit).await
    }

    async fn messages_for_matches(&self, match_ids: &[Uuid]) -> StoreResult<Vec<Message>> {
        messages::get_messages_for_matches(&self.pool, match_ids).await
    }

    async fn last_message(&self, match_id: Uuid) -> StoreResult<Option<Message>> {
        messages::get_last_message(&self.pool, match_id).await
    }

    async fn count_unread(&self, match_id: Uuid, reader: Uuid) -> StoreResult<i64> {
        messages::count_unread(&self.pool, match_id, reader).await
    }

    async fn delete_message(&self, message_id: Uuid) -> StoreResult<bool> {
        messages::delete_message(&self.pool, message_id).await
    }

    async fn delete_messages_for_match(&self, match_id: Uuid) -> StoreResult<u64> {
        messages::delete_messages_for_match(&self.pool, match_id).await
    }

    async fn delete_unread_messages_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        messages::delete_unread_messages_before(&self.pool, cutoff).await
    }

    async fn insert_call(&self, match_id: Uuid, initiator: Uuid, receiver: Uuid, call_type: CallType) -> StoreResult<Call> {
        calls::insert_call(&self.pool, match_id, initiator, receiver, call_type).await
    }

    async fn accept_call(&self, call_id: Uuid, receiver: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Call>> {
        calls::accept_call(&self.pool, call_id, receiver, now).await
    }

    async fn reject_call(&self, call_id: Uuid, receiver: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Call>> {
        calls::reject_call(&self.pool, call_id, receiver, now).await
    }

    async fn end_call(&self, call_id: Uuid, initiator: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Call>> {
        calls::end_call(&self.pool, call_id, initiator, now).await
    }

    async fn latest_call_for_match(&self, match_id: Uuid) -> StoreResult<Option<Call>> {
        calls::get_latest_call_for_match(&self.pool, match_id).await
    }

    async fn expire_pending_calls(&self, created_before: DateTime<Utc>, now: DateTime<Utc>) -> StoreResult<Vec<Call>> {
        calls::expire_pending_calls(&self.pool, created_before, now).await
    }

    async fn delete_ended_calls_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        calls::delete_ended_calls_before(&self.pool, cutoff).await
    }

    async fn insert_confession(&self, sender: Uuid, content: &str) -> StoreResult<Confession> {
        confessions::insert_confession(&self.pool, sender, content).await
    }

    async fn claim_confession(&self, requester: Uuid) -> StoreResult<Option<Confession>> {
        confessions::claim_confession(&self.pool, requester).await
    }

    async fn insert_notification(
        &self,
        recipient: Uuid,
        notification_type: NotificationType,
        content: &str,
        metadata: serde_json::Value,
    ) -> StoreResult<Notification> {
        notifications::insert_notification(&self.pool, recipient, notification_type, content, metadata).await
    }

    async fn list_notifications(&self, user_id: Uuid, unread_only: bool, limit: i64) -> StoreResult<Vec<Notification>> {
        notifications::list_notifications(&self.pool, user_id, unread_only, limit).await
    }

    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        notifications::mark_notification_read(&self.pool, notification_id, user_id).await
    }

    async fn clear_notifications(&self, user_id: Uuid) -> StoreResult<u64> {
        notifications::clear_notifications(&self.pool, user_id).await
    }
}
