//! In-process directory with the same semantics as the Postgres schema,
//! including its uniqueness constraints. Backs the test suite and the
//! database-less dev server.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use std::cmp::Ordering;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::constants::{ANY_PREFERENCE, METERS_PER_MILE};
use crate::db::{Directory, StoreError, StoreResult};
use crate::models::{
    Call, CallStatus, CallType, Candidate, Confession, FilterPreferences, Location, Match,
    Message, NewUser, Notification, NotificationType, Photo, ProfileUpdate, Swipe,
    SwipeDirection, User,
};
use crate::utils::geo::haversine_meters;

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    swipes: Vec<Swipe>,
    matches: Vec<Match>,
    messages: Vec<Message>,
    calls: Vec<Call>,
    confessions: Vec<Confession>,
    notifications: Vec<Notification>,
}

impl MemoryState {
    fn user_mut(&mut self, user_id: Uuid) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.id == user_id)
    }

    fn has_active_match(&self, user_a: Uuid, user_b: Uuid) -> bool {
        self.matches
            .iter()
            .any(|m| m.is_active && m.involves(user_a) && m.involves(user_b))
    }
}

#[derive(Debug, Default)]
pub struct MemoryDirectory {
    state: Mutex<MemoryState>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T>(items: &mut [T], created_at: impl Fn(&T) -> DateTime<Utc>) {
    // Stable sort keeps insertion order for equal timestamps; reversing
    // afterwards puts the latest insert first.
    items.sort_by_key(|item| created_at(item));
    items.reverse();
}

#[async_trait]
impl Directory for MemoryDirectory {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;
        if state
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&new_user.email))
        {
            return Err(StoreError::Duplicate("email".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new_user.email,
            password_hash: new_user.password_hash,
            name: new_user.name,
            age: new_user.age,
            gender: new_user.gender,
            bio: String::new(),
            relationship_type: ANY_PREFERENCE.to_string(),
            photos: Json(Vec::new()),
            selfie: String::new(),
            is_verified: false,
            verification_token: Some(new_user.verification_token),
            reset_password_token: None,
            reset_password_expires: None,
            filter_preferences: FilterPreferences::default(),
            location: Location::default(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn verify_user_by_token(&self, token: &str) -> StoreResult<Option<User>> {
        let mut state = self.state.lock().await;
        let Some(user) = state
            .users
            .iter_mut()
            .find(|u| u.verification_token.as_deref() == Some(token))
        else {
            return Ok(None);
        };
        user.is_verified = true;
        user.verification_token = None;
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn mark_user_verified(&self, user_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.user_mut(user_id) {
            Some(user) => {
                user.is_verified = true;
                user.verification_token = None;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn set_reset_token(&self, user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.user_mut(user_id) {
            user.reset_password_token = Some(token.to_string());
            user.reset_password_expires = Some(expires_at);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn reset_password_by_token(&self, token: &str, password_hash: &str, now: DateTime<Utc>) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let Some(user) = state.users.iter_mut().find(|u| {
            u.reset_password_token.as_deref() == Some(token)
                && u.reset_password_expires.is_some_and(|expires| expires > now)
        }) else {
            return Ok(false);
        };
        user.password_hash = password_hash.to_string();
        user.reset_password_token = None;
        user.reset_password_expires = None;
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn update_password(&self, user_id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        if let Some(user) = state.user_mut(user_id) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_profile(&self, user_id: Uuid, update: &ProfileUpdate) -> StoreResult<Option<User>> {
        let mut state = self.state.lock().await;
        let Some(user) = state.user_mut(user_id) else {
            return Ok(None);
        };

        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(age) = update.age {
            user.age = age;
        }
        if let Some(gender) = &update.gender {
            user.gender = gender.clone();
        }
        if let Some(bio) = &update.bio {
            user.bio = bio.clone();
        }
        if let Some(relationship_type) = &update.relationship_type {
            user.relationship_type = relationship_type.clone();
        }

        let prefs = &mut user.filter_preferences;
        if let Some(age_min) = update.age_min {
            prefs.age_min = age_min;
        }
        if let Some(age_max) = update.age_max {
            prefs.age_max = age_max;
        }
        if let Some(max_distance) = update.max_distance {
            prefs.max_distance = max_distance;
        }
        if let Some(seeking_gender) = &update.seeking_gender {
            prefs.seeking_gender = seeking_gender.clone();
        }
        if let Some(relationship_type) = &update.seeking_relationship_type {
            prefs.relationship_type = relationship_type.clone();
        }

        if update.latitude.is_some() {
            user.location.latitude = update.latitude;
        }
        if update.longitude.is_some() {
            user.location.longitude = update.longitude;
        }

        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn append_photo(&self, user_id: Uuid, photo: Photo, max_photos: usize) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let Some(user) = state.user_mut(user_id) else {
            return Ok(false);
        };
        if user.photos.len() >= max_photos {
            return Ok(false);
        }
        user.photos.0.push(photo);
        user.updated_at = Utc::now();
        Ok(true)
    }

    async fn remove_photo(&self, user_id: Uuid, photo_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let Some(user) = state.user_mut(user_id) else {
            return Ok(false);
        };
        let before = user.photos.len();
        user.photos.0.retain(|p| p.id != photo_id);
        Ok(user.photos.len() < before)
    }

    async fn set_selfie(&self, user_id: Uuid, url: &str) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.user_mut(user_id) {
            Some(user) => {
                user.selfie = url.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn delete_user(&self, user_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.users.len();
        state.users.retain(|u| u.id != user_id);
        if state.users.len() == before {
            return Ok(false);
        }

        let dropped_matches: Vec<Uuid> = state
            .matches
            .iter()
            .filter(|m| m.involves(user_id))
            .map(|m| m.id)
            .collect();

        state.swipes.retain(|s| s.user_id != user_id && s.target_id != user_id);
        state.matches.retain(|m| !m.involves(user_id));
        state
            .messages
            .retain(|m| m.sender_id != user_id && !dropped_matches.contains(&m.match_id));
        state.calls.retain(|c| !dropped_matches.contains(&c.match_id));
        state
            .confessions
            .retain(|c| c.anonymous_id != user_id && c.delivered_to != Some(user_id));
        state.notifications.retain(|n| n.user_id != user_id);
        Ok(true)
    }

    async fn find_candidates(&self, requester: &User, limit: i64) -> StoreResult<Vec<Candidate>> {
        let state = self.state.lock().await;
        let prefs = &requester.filter_preferences;
        let origin = requester.location.coordinates();
        let max_meters = prefs.max_distance * METERS_PER_MILE;

        let mut found: Vec<(Option<f64>, &User)> = state
            .users
            .iter()
            .filter(|u| u.id != requester.id && u.is_verified)
            .filter(|u| u.age >= prefs.age_min && u.age <= prefs.age_max)
            .filter(|u| prefs.seeking_gender == ANY_PREFERENCE || u.gender == prefs.seeking_gender)
            .filter(|u| {
                prefs.relationship_type == ANY_PREFERENCE
                    || u.relationship_type == prefs.relationship_type
            })
            .filter(|u| {
                !state
                    .swipes
                    .iter()
                    .any(|s| s.user_id == requester.id && s.target_id == u.id)
            })
            .filter_map(|u| match origin {
                None => Some((None, u)),
                Some(from) => {
                    let to = u.location.coordinates()?;
                    let distance = haversine_meters(from, to);
                    (distance <= max_meters).then_some((Some(distance), u))
                }
            })
            .collect();

        found.sort_by(|(da, ua), (db, ub)| {
            let by_distance = match (da, db) {
                (Some(a), Some(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            by_distance
                .then(ua.created_at.cmp(&ub.created_at))
                .then(ua.id.cmp(&ub.id))
        });

        Ok(found
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|(distance, u)| Candidate {
                id: u.id,
                name: u.name.clone(),
                age: u.age,
                gender: u.gender.clone(),
                bio: u.bio.clone(),
                photos: u.photos.0.clone(),
                distance_miles: distance.map(|m| m / METERS_PER_MILE),
            })
            .collect())
    }

    async fn insert_swipe(&self, actor: Uuid, target: Uuid, direction: SwipeDirection) -> StoreResult<Swipe> {
        let mut state = self.state.lock().await;
        if state
            .swipes
            .iter()
            .any(|s| s.user_id == actor && s.target_id == target)
        {
            return Err(StoreError::Duplicate("swipe".to_string()));
        }
        let swipe = Swipe {
            id: Uuid::new_v4(),
            user_id: actor,
            target_id: target,
            direction,
            created_at: Utc::now(),
        };
        state.swipes.push(swipe.clone());
        Ok(swipe)
    }

    async fn find_swipe(&self, actor: Uuid, target: Uuid) -> StoreResult<Option<Swipe>> {
        let state = self.state.lock().await;
        Ok(state
            .swipes
            .iter()
            .find(|s| s.user_id == actor && s.target_id == target)
            .cloned())
    }

    async fn has_liked(&self, actor: Uuid, target: Uuid) -> StoreResult<bool> {
        let state = self.state.lock().await;
        Ok(state.swipes.iter().any(|s| {
            s.user_id == actor && s.target_id == target && s.direction == SwipeDirection::Like
        }))
    }

    async fn find_swipe_by_owner(&self, swipe_id: Uuid, actor: Uuid) -> StoreResult<Option<Swipe>> {
        let state = self.state.lock().await;
        Ok(state
            .swipes
            .iter()
            .find(|s| s.id == swipe_id && s.user_id == actor)
            .cloned())
    }

    async fn delete_swipe_unless_matched(&self, swipe_id: Uuid, actor: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let Some(target) = state
            .swipes
            .iter()
            .find(|s| s.id == swipe_id && s.user_id == actor)
            .map(|s| s.target_id)
        else {
            return Ok(false);
        };
        if state.has_active_match(actor, target) {
            return Ok(false);
        }
        state.swipes.retain(|s| s.id != swipe_id);
        Ok(true)
    }

    async fn insert_match(&self, user_a: Uuid, user_b: Uuid) -> StoreResult<Match> {
        let mut state = self.state.lock().await;
        if state.has_active_match(user_a, user_b) {
            return Err(StoreError::Duplicate("match".to_string()));
        }
        let created = Match {
            id: Uuid::new_v4(),
            user1_id: user_a,
            user2_id: user_b,
            is_active: true,
            created_at: Utc::now(),
        };
        state.matches.push(created.clone());
        Ok(created)
    }

    async fn find_active_match_between(&self, user_a: Uuid, user_b: Uuid) -> StoreResult<Option<Match>> {
        let state = self.state.lock().await;
        Ok(state
            .matches
            .iter()
            .find(|m| m.is_active && m.involves(user_a) && m.involves(user_b))
            .cloned())
    }

    async fn find_active_match_for(&self, match_id: Uuid, participant: Uuid) -> StoreResult<Option<Match>> {
        let state = self.state.lock().await;
        Ok(state
            .matches
            .iter()
            .find(|m| m.id == match_id && m.is_active && m.involves(participant))
            .cloned())
    }

    async fn list_active_matches(&self, user_id: Uuid) -> StoreResult<Vec<Match>> {
        let state = self.state.lock().await;
        let mut found: Vec<Match> = state
            .matches
            .iter()
            .filter(|m| m.is_active && m.involves(user_id))
            .cloned()
            .collect();
        newest_first(&mut found, |m| m.created_at);
        Ok(found)
    }

    async fn deactivate_match(&self, match_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state
            .matches
            .iter_mut()
            .find(|m| m.id == match_id && m.is_active)
        {
            Some(m) => {
                m.is_active = false;
                true
            }
            None => false,
        })
    }

    async fn insert_message(&self, match_id: Uuid, sender: Uuid, content: &str, is_image: bool) -> StoreResult<Message> {
        let mut state = self.state.lock().await;
        let message = Message {
            id: Uuid::new_v4(),
            match_id,
            sender_id: sender,
            content: content.to_string(),
            is_image,
            read_status: false,
            created_at: Utc::now(),
        };
        state.messages.push(message.clone());
        Ok(message)
    }

    async fn get_message(&self, message_id: Uuid) -> StoreResult<Option<Message>> {
        let state = self.state.lock().await;
        Ok(state.messages.iter().find(|m| m.id == message_id).cloned())
    }

    async fn mark_messages_read(&self, match_id: Uuid, reader: Uuid) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let mut updated = 0;
        for message in state
            .messages
            .iter_mut()
            .filter(|m| m.match_id == match_id && m.sender_id != reader && !m.read_status)
        {
            message.read_status = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn mark_message_read(&self, message_id: Uuid, match_id: Uuid, reader: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.messages.iter_mut().find(|m| {
            m.id == message_id && m.match_id == match_id && m.sender_id != reader && !m.read_status
        }) {
            Some(message) => {
                message.read_status = true;
                true
            }
            None => false,
        })
    }

    async fn messages_page_desc(&self, match_id: Uuid, offset: i64, limit: i64) -> StoreResult<Vec<Message>> {
        let state = self.state.lock().await;
        let mut found: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.match_id == match_id)
            .cloned()
            .collect();
        newest_first(&mut found, |m| m.created_at);
        Ok(found
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn messages_for_matches(&self, match_ids: &[Uuid]) -> StoreResult<Vec<Message>> {
        let state = self.state.lock().await;
        let mut found: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| match_ids.contains(&m.match_id))
            .cloned()
            .collect();
        found.sort_by_key(|m| m.created_at);
        Ok(found)
    }

    async fn last_message(&self, match_id: Uuid) -> StoreResult<Option<Message>> {
        Ok(self.messages_page_desc(match_id, 0, 1).await?.into_iter().next())
    }

    async fn count_unread(&self, match_id: Uuid, reader: Uuid) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .messages
            .iter()
            .filter(|m| m.match_id == match_id && m.sender_id != reader && !m.read_status)
            .count() as i64)
    }

    async fn delete_message(&self, message_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        let before = state.messages.len();
        state.messages.retain(|m| m.id != message_id);
        Ok(state.messages.len() < before)
    }

    async fn delete_messages_for_match(&self, match_id: Uuid) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.messages.len();
        state.messages.retain(|m| m.match_id != match_id);
        Ok((before - state.messages.len()) as u64)
    }

    async fn delete_unread_messages_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.messages.len();
        state
            .messages
            .retain(|m| m.read_status || m.created_at >= cutoff);
        Ok((before - state.messages.len()) as u64)
    }

    async fn insert_call(&self, match_id: Uuid, initiator: Uuid, receiver: Uuid, call_type: CallType) -> StoreResult<Call> {
        let mut state = self.state.lock().await;
        if state
            .calls
            .iter()
            .any(|c| c.match_id == match_id && c.status.is_in_flight())
        {
            return Err(StoreError::Duplicate("call".to_string()));
        }
        let call = Call {
            id: Uuid::new_v4(),
            match_id,
            initiator_id: initiator,
            receiver_id: receiver,
            call_type,
            status: CallStatus::Pending,
            start_time: None,
            end_time: None,
            created_at: Utc::now(),
        };
        state.calls.push(call.clone());
        Ok(call)
    }

    async fn accept_call(&self, call_id: Uuid, receiver: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Call>> {
        let mut state = self.state.lock().await;
        Ok(state
            .calls
            .iter_mut()
            .find(|c| c.id == call_id && c.receiver_id == receiver && c.status == CallStatus::Pending)
            .map(|call| {
                call.status = CallStatus::Active;
                call.start_time = Some(now);
                call.clone()
            }))
    }

    async fn reject_call(&self, call_id: Uuid, receiver: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Call>> {
        let mut state = self.state.lock().await;
        Ok(state
            .calls
            .iter_mut()
            .find(|c| c.id == call_id && c.receiver_id == receiver && c.status == CallStatus::Pending)
            .map(|call| {
                call.status = CallStatus::Ended;
                call.end_time = Some(now);
                call.clone()
            }))
    }

    async fn end_call(&self, call_id: Uuid, initiator: Uuid, now: DateTime<Utc>) -> StoreResult<Option<Call>> {
        let mut state = self.state.lock().await;
        Ok(state
            .calls
            .iter_mut()
            .find(|c| c.id == call_id && c.initiator_id == initiator && c.status.is_in_flight())
            .map(|call| {
                call.status = CallStatus::Ended;
                call.end_time = Some(now);
                call.start_time = Some(call.start_time.unwrap_or(call.created_at));
                call.clone()
            }))
    }

    async fn latest_call_for_match(&self, match_id: Uuid) -> StoreResult<Option<Call>> {
        let state = self.state.lock().await;
        let mut found: Vec<Call> = state
            .calls
            .iter()
            .filter(|c| c.match_id == match_id)
            .cloned()
            .collect();
        newest_first(&mut found, |c| c.created_at);
        Ok(found.into_iter().next())
    }

    async fn expire_pending_calls(&self, created_before: DateTime<Utc>, now: DateTime<Utc>) -> StoreResult<Vec<Call>> {
        let mut state = self.state.lock().await;
        Ok(state
            .calls
            .iter_mut()
            .filter(|c| c.status == CallStatus::Pending && c.created_at < created_before)
            .map(|call| {
                call.status = CallStatus::Ended;
                call.end_time = Some(now);
                call.clone()
            })
            .collect())
    }

    async fn delete_ended_calls_before(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.calls.len();
        state.calls.retain(|c| {
            !(c.status == CallStatus::Ended && c.end_time.is_some_and(|end| end < cutoff))
        });
        Ok((before - state.calls.len()) as u64)
    }

    async fn insert_confession(&self, sender: Uuid, content: &str) -> StoreResult<Confession> {
        let mut state = self.state.lock().await;
        let confession = Confession {
            id: Uuid::new_v4(),
            content: content.to_string(),
            anonymous_id: sender,
            delivered_to: None,
            created_at: Utc::now(),
        };
        state.confessions.push(confession.clone());
        Ok(confession)
    }

    async fn claim_confession(&self, requester: Uuid) -> StoreResult<Option<Confession>> {
        let mut state = self.state.lock().await;
        // Vec order is creation order; `min_by_key` keeps the first of equals.
        let Some(confession) = state
            .confessions
            .iter_mut()
            .filter(|c| c.delivered_to.is_none() && c.anonymous_id != requester)
            .min_by_key(|c| c.created_at)
        else {
            return Ok(None);
        };
        confession.delivered_to = Some(requester);
        Ok(Some(confession.clone()))
    }

    async fn insert_notification(
        &self,
        recipient: Uuid,
        notification_type: NotificationType,
        content: &str,
        metadata: serde_json::Value,
    ) -> StoreResult<Notification> {
        let mut state = self.state.lock().await;
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: recipient,
            notification_type,
            content: content.to_string(),
            metadata: Json(metadata),
            read_status: false,
            created_at: Utc::now(),
        };
        state.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(&self, user_id: Uuid, unread_only: bool, limit: i64) -> StoreResult<Vec<Notification>> {
        let state = self.state.lock().await;
        let mut found: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read_status))
            .cloned()
            .collect();
        newest_first(&mut found, |n| n.created_at);
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn mark_notification_read(&self, notification_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification_id && n.user_id == user_id)
        {
            Some(notification) => {
                notification.read_status = true;
                true
            }
            None => false,
        })
    }

    async fn clear_notifications(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let before = state.notifications.len();
        state.notifications.retain(|n| n.user_id != user_id);
        Ok((before - state.notifications.len()) as u64)
    }
}
