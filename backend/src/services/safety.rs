use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub const SAFETY_GUIDELINES: [&str; 6] = [
    "Always meet in a public place for the first time.",
    "Tell a friend or family member about your plans, including where you'll be and who you're meeting.",
    "Verify the person's identity through video chat before meeting in person.",
    "Trust your instincts. If something feels off, leave.",
    "Keep your personal information private until you feel comfortable.",
    "Use the app's messaging system initially to communicate.",
];

pub fn guidelines() -> Vec<&'static str> {
    SAFETY_GUIDELINES.to_vec()
}

/// Stores the selfie and marks the account verified. No face matching is
/// performed.
pub async fn verify_selfie(state: &AppState, user_id: Uuid, bytes: Vec<u8>, file_name: &str) -> AppResult<String> {
    if state.directory.get_user(user_id).await?.is_none() {
        return Err(AppError::not_found("User not found"));
    }
    if bytes.is_empty() {
        return Err(AppError::validation("No selfie uploaded"));
    }

    let url = state.media.upload(bytes, file_name).await?;
    state.directory.set_selfie(user_id, &url).await?;
    state.directory.mark_user_verified(user_id).await?;
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::testing::TestApp;

    #[test]
    fn test_guidelines() {
        assert_eq!(guidelines().len(), 6);
    }

    #[tokio::test]
    async fn test_verify_selfie_marks_verified() {
        let app = TestApp::new().await;
        let user = app
            .directory()
            .create_user(NewUser {
                email: "a@example.com".into(),
                password_hash: "x".into(),
                name: "Ada".into(),
                age: 30,
                gender: "female".into(),
                verification_token: "tok".into(),
            })
            .await
            .unwrap();

        let url = verify_selfie(&app.state, user.id, b"face".to_vec(), "me.jpg").await.unwrap();

        let stored = app.directory().get_user(user.id).await.unwrap().unwrap();
        assert!(stored.is_verified);
        assert_eq!(stored.selfie, url);
    }

    #[tokio::test]
    async fn test_failed_upload_changes_nothing() {
        let app = TestApp::new().await;
        let user = app.user("Ada").await;
        app.media.fail_uploads();

        assert!(matches!(
            verify_selfie(&app.state, user.id, b"face".to_vec(), "me.jpg").await,
            Err(AppError::Upstream(_))
        ));
        assert!(app.directory().get_user(user.id).await.unwrap().unwrap().selfie.is_empty());
    }
}
