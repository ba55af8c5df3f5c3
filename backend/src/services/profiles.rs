use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::constants::{MAX_BIO_LENGTH, MAX_PHOTOS, MIN_USER_AGE};
use crate::error::{AppError, AppResult};
use crate::models::{Photo, ProfileUpdate, User};
use crate::state::AppState;
use crate::utils::geo::is_valid_coordinate;
use crate::utils::validation::check_password;

async fn load_user(state: &AppState, user_id: Uuid) -> AppResult<User> {
    state
        .directory
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn get_profile(state: &AppState, user_id: Uuid) -> AppResult<User> {
    load_user(state, user_id).await
}

fn check_update(current: &User, update: &ProfileUpdate) -> AppResult<()> {
    if update.name.as_deref().is_some_and(|name| name.trim().is_empty()) {
        return Err(AppError::validation("Name cannot be empty"));
    }
    if update.age.is_some_and(|age| age < MIN_USER_AGE) {
        return Err(AppError::validation(format!("Age must be at least {}", MIN_USER_AGE)));
    }
    if update
        .bio
        .as_deref()
        .is_some_and(|bio| bio.chars().count() > MAX_BIO_LENGTH)
    {
        return Err(AppError::validation(format!(
            "Bio must be at most {} characters",
            MAX_BIO_LENGTH
        )));
    }

    let age_min = update.age_min.unwrap_or(current.filter_preferences.age_min);
    let age_max = update.age_max.unwrap_or(current.filter_preferences.age_max);
    if age_min < MIN_USER_AGE || age_min > age_max {
        return Err(AppError::validation("Invalid age range"));
    }
    if update.max_distance.is_some_and(|d| !d.is_finite() || d <= 0.0) {
        return Err(AppError::validation("Max distance must be positive"));
    }

    match (update.latitude, update.longitude) {
        (None, None) => {}
        (Some(lat), Some(lng)) if is_valid_coordinate(lat, lng) => {}
        (Some(_), Some(_)) => return Err(AppError::validation("Invalid coordinates")),
        _ => {
            return Err(AppError::validation(
                "Latitude and longitude must be provided together",
            ));
        }
    }
    Ok(())
}

/// Partial update; absent fields keep their value.
pub async fn edit_profile(state: &AppState, user_id: Uuid, update: ProfileUpdate) -> AppResult<User> {
    let current = load_user(state, user_id).await?;
    check_update(&current, &update)?;

    state
        .directory
        .update_profile(user_id, &update)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn change_password(state: &AppState, user_id: Uuid, old_password: &str, new_password: &str) -> AppResult<()> {
    let user = load_user(state, user_id).await?;
    if !verify_password(old_password, &user.password_hash).await? {
        return Err(AppError::validation("Incorrect old password"));
    }
    check_password(new_password)?;

    let hashed = hash_password(new_password).await?;
    state.directory.update_password(user_id, &hashed).await?;
    Ok(())
}

/// Deletes the account with everything that hangs off it and closes the
/// user's live connections.
pub async fn delete_profile(state: &AppState, user_id: Uuid) -> AppResult<()> {
    if !state.directory.delete_user(user_id).await? {
        return Err(AppError::not_found("User not found"));
    }
    state.registry.drop_user(user_id).await;
    tracing::info!("👤 Deleted user {}", user_id);
    Ok(())
}

pub async fn add_photo(
    state: &AppState,
    user_id: Uuid,
    bytes: Vec<u8>,
    file_name: &str,
    caption: Option<String>,
) -> AppResult<Photo> {
    let user = load_user(state, user_id).await?;
    if user.photos.len() >= MAX_PHOTOS {
        return Err(AppError::validation(format!("Maximum {} photos allowed", MAX_PHOTOS)));
    }
    if bytes.is_empty() {
        return Err(AppError::validation("No photo uploaded"));
    }

    let photo = Photo {
        id: Uuid::new_v4(),
        url: state.media.upload(bytes, file_name).await?,
        caption: caption.unwrap_or_default(),
    };
    // Limit re-checked atomically; a concurrent upload may have filled the slot.
    if !state
        .directory
        .append_photo(user_id, photo.clone(), MAX_PHOTOS)
        .await?
    {
        return Err(AppError::validation(format!("Maximum {} photos allowed", MAX_PHOTOS)));
    }
    Ok(photo)
}

pub async fn delete_photo(state: &AppState, user_id: Uuid, photo_id: Uuid) -> AppResult<()> {
    if !state.directory.remove_photo(user_id, photo_id).await? {
        return Err(AppError::not_found("Photo not found"));
    }
    Ok(())
}

/// Returns the new profile picture URL.
pub async fn update_profile_pic(state: &AppState, user_id: Uuid, bytes: Vec<u8>, file_name: &str) -> AppResult<String> {
    load_user(state, user_id).await?;
    if bytes.is_empty() {
        return Err(AppError::validation("No photo uploaded"));
    }
    let url = state.media.upload(bytes, file_name).await?;
    if !state.directory.set_selfie(user_id, &url).await? {
        return Err(AppError::not_found("User not found"));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SwipeDirection;
    use crate::services::{conversations, matching};
    use crate::testing::TestApp;

    #[tokio::test]
    async fn test_edit_profile_is_partial() {
        let app = TestApp::new().await;
        let user = app.user("Ada").await;

        let updated = edit_profile(
            &app.state,
            user.id,
            ProfileUpdate {
                bio: Some("hello".into()),
                seeking_gender: Some("male".into()),
                latitude: Some(51.5),
                longitude: Some(-0.12),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.name, "Ada");
        assert_eq!(updated.bio, "hello");
        assert_eq!(updated.filter_preferences.seeking_gender, "male");
        assert_eq!(updated.location.coordinates(), Some((51.5, -0.12)));
    }

    #[tokio::test]
    async fn test_edit_profile_validation() {
        let app = TestApp::new().await;
        let user = app.user("Ada").await;
        let bad = [
            ProfileUpdate { age_min: Some(50), age_max: Some(30), ..Default::default() },
            ProfileUpdate { age_min: Some(150), ..Default::default() },
            ProfileUpdate { age: Some(12), ..Default::default() },
            ProfileUpdate { latitude: Some(10.0), ..Default::default() },
            ProfileUpdate { latitude: Some(91.0), longitude: Some(0.0), ..Default::default() },
            ProfileUpdate { max_distance: Some(-1.0), ..Default::default() },
            ProfileUpdate { bio: Some("x".repeat(MAX_BIO_LENGTH + 1)), ..Default::default() },
        ];
        for update in bad {
            assert!(matches!(
                edit_profile(&app.state, user.id, update).await,
                Err(AppError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_change_password_requires_old_password() {
        let app = TestApp::new().await;
        let user = app.user("Ada").await;
        let hashed = hash_password("original").await.unwrap();
        app.directory().update_password(user.id, &hashed).await.unwrap();

        assert!(matches!(
            change_password(&app.state, user.id, "wrong", "newpass1").await,
            Err(AppError::Validation(_))
        ));
        change_password(&app.state, user.id, "original", "newpass1").await.unwrap();

        let stored = app.directory().get_user(user.id).await.unwrap().unwrap();
        assert!(verify_password("newpass1", &stored.password_hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_photo_limit() {
        let app = TestApp::new().await;
        let user = app.user("Ada").await;
        for i in 0..MAX_PHOTOS {
            add_photo(&app.state, user.id, b"img".to_vec(), &format!("{}.jpg", i), None)
                .await
                .unwrap();
        }

        assert!(matches!(
            add_photo(&app.state, user.id, b"img".to_vec(), "extra.jpg", None).await,
            Err(AppError::Validation(_))
        ));
        // Rejected before anything is uploaded
        assert_eq!(app.media.uploads().await.len(), MAX_PHOTOS);
    }

    #[tokio::test]
    async fn test_delete_photo() {
        let app = TestApp::new().await;
        let user = app.user("Ada").await;
        let photo = add_photo(&app.state, user.id, b"img".to_vec(), "a.jpg", Some("beach".into()))
            .await
            .unwrap();
        assert_eq!(photo.caption, "beach");

        delete_photo(&app.state, user.id, photo.id).await.unwrap();
        assert!(matches!(
            delete_photo(&app.state, user.id, photo.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(get_profile(&app.state, user.id).await.unwrap().photos.is_empty());
    }

    #[tokio::test]
    async fn test_profile_pic_becomes_display_photo() {
        let app = TestApp::new().await;
        let user = app.user("Ada").await;

        let url = update_profile_pic(&app.state, user.id, b"img".to_vec(), "me.png").await.unwrap();

        assert_eq!(get_profile(&app.state, user.id).await.unwrap().display_photo(), url);
    }

    #[tokio::test]
    async fn test_delete_profile_cascades_and_disconnects() {
        let app = TestApp::new().await;
        let (a, b) = (app.user("Ada").await, app.user("Bob").await);
        matching::record_swipe(&app.state, a.id, b.id, SwipeDirection::Like).await.unwrap();
        let outcome = matching::record_swipe(&app.state, b.id, a.id, SwipeDirection::Like)
            .await
            .unwrap();
        let match_id = outcome.match_id.unwrap();
        conversations::send_message(&app.state, match_id, a.id, "hi").await.unwrap();
        let (_, mut rx) = app.connect(a.id).await;

        delete_profile(&app.state, a.id).await.unwrap();

        assert!(rx.recv().await.is_none());
        assert!(conversations::get_chats(&app.state, b.id).await.unwrap().is_empty());
        assert!(app.directory().find_swipe(b.id, a.id).await.unwrap().is_none());
        assert!(matches!(
            get_profile(&app.state, a.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            delete_profile(&app.state, a.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
