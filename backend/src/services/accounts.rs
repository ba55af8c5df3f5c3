//! Registration, email verification, login and password reset.

use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::auth::{hash_password, issue_token, verify_password};
use crate::constants::{MIN_USER_AGE, RESET_TOKEN_TTL_MINUTES};
use crate::db::StoreError;
use crate::error::{AppError, AppResult};
use crate::mail::OutgoingMail;
use crate::models::{NewUser, User};
use crate::state::AppState;
use crate::utils::tokens::generate_token;
use crate::utils::validation::{check_password, is_valid_email};

const BAD_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
    pub age: i32,
    pub gender: String,
}

/// Creates an unverified account and mails the verification link.
pub async fn register(state: &AppState, registration: Registration) -> AppResult<User> {
    let email = registration.email.trim().to_string();
    if !is_valid_email(&email) {
        return Err(AppError::validation("Invalid email address"));
    }
    check_password(&registration.password)?;
    if registration.name.trim().is_empty() {
        return Err(AppError::validation("Name is required"));
    }
    if registration.gender.trim().is_empty() {
        return Err(AppError::validation("Gender is required"));
    }
    if registration.age < MIN_USER_AGE {
        return Err(AppError::validation(format!(
            "You must be at least {} years old",
            MIN_USER_AGE
        )));
    }
    if state.directory.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::conflict("Email already in use"));
    }

    let verification_token = generate_token();
    let user = match state
        .directory
        .create_user(NewUser {
            email: email.clone(),
            password_hash: hash_password(&registration.password).await?,
            name: registration.name.trim().to_string(),
            age: registration.age,
            gender: registration.gender.trim().to_string(),
            verification_token: verification_token.clone(),
        })
        .await
    {
        Ok(user) => user,
        Err(StoreError::Duplicate(_)) => return Err(AppError::conflict("Email already in use")),
        Err(e) => return Err(e.into()),
    };

    let link = format!("{}/api/auth/verify/{}", state.config.app_url, verification_token);
    send_mail(
        state,
        &email,
        "Welcome to L.I.F - Verify Your Email",
        format!("Click here to verify your email: {}", link),
    )
    .await;

    tracing::info!("👤 Registered user {}", user.id);
    Ok(user)
}

/// Consumes the verification token and returns a session token.
pub async fn verify_email(state: &AppState, token: &str) -> AppResult<String> {
    let user = state
        .directory
        .verify_user_by_token(token)
        .await?
        .ok_or_else(|| AppError::validation("Invalid or expired verification token"))?;

    issue_token(user.id, &state.config.jwt_secret, state.config.jwt_expiry_hours)
}

pub async fn login(state: &AppState, email: &str, password: &str) -> AppResult<String> {
    let user = state
        .directory
        .find_user_by_email(email.trim())
        .await?
        .ok_or_else(|| AppError::validation(BAD_CREDENTIALS))?;

    if !user.is_verified {
        return Err(AppError::Forbidden("Please verify your email first".to_string()));
    }
    if !verify_password(password, &user.password_hash).await? {
        return Err(AppError::validation(BAD_CREDENTIALS));
    }

    issue_token(user.id, &state.config.jwt_secret, state.config.jwt_expiry_hours)
}

pub async fn forgot_password(state: &AppState, email: &str) -> AppResult<()> {
    let user = state
        .directory
        .find_user_by_email(email.trim())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let token = generate_token();
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
    state.directory.set_reset_token(user.id, &token, expires_at).await?;

    let link = format!("{}/api/auth/reset-password/{}", state.config.app_url, token);
    send_mail(
        state,
        &user.email,
        "L.I.F - Reset Your Password",
        format!("Click here to reset your password: {}. Expires in 1 hour.", link),
    )
    .await;
    Ok(())
}

pub async fn reset_password(state: &AppState, token: &str, password: &str) -> AppResult<()> {
    check_password(password)?;
    let hashed = hash_password(password).await?;
    if !state
        .directory
        .reset_password_by_token(token, &hashed, Utc::now())
        .await?
    {
        return Err(AppError::validation("Invalid or expired reset token"));
    }
    Ok(())
}

// Delivery failures are logged; the account change has already happened.
async fn send_mail(state: &AppState, to: &str, subject: &str, text: String) {
    let mail = OutgoingMail {
        to: to.to_string(),
        subject: subject.to_string(),
        text,
    };
    if let Err(e) = state.mailer.send(mail).await {
        tracing::error!("❌ Failed to send '{}' to {}: {}", subject, to, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::decode_token;
    use crate::testing::{TestApp, TEST_SECRET};

    fn registration(email: &str) -> Registration {
        Registration {
            email: email.to_string(),
            password: "secret123".to_string(),
            name: "Ada".to_string(),
            age: 30,
            gender: "female".to_string(),
        }
    }

    fn token_in(text: &str) -> String {
        text.rsplit('/')
            .next()
            .unwrap()
            .split(|c: char| !c.is_ascii_hexdigit())
            .next()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_register_verify_login() {
        let app = TestApp::new().await;
        let user = register(&app.state, registration("Ada@Example.com")).await.unwrap();
        assert!(!user.is_verified);

        // Unverified accounts cannot log in
        assert!(matches!(
            login(&app.state, "ada@example.com", "secret123").await,
            Err(AppError::Forbidden(_))
        ));

        let sent = app.mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].text.contains("/api/auth/verify/"));
        let jwt = verify_email(&app.state, &token_in(&sent[0].text)).await.unwrap();
        assert_eq!(decode_token(&jwt, TEST_SECRET).unwrap(), user.id);

        let jwt = login(&app.state, "ADA@example.com", "secret123").await.unwrap();
        assert_eq!(decode_token(&jwt, TEST_SECRET).unwrap(), user.id);
    }

    #[tokio::test]
    async fn test_verification_token_is_single_use() {
        let app = TestApp::new().await;
        register(&app.state, registration("ada@example.com")).await.unwrap();
        let token = token_in(&app.mailer.sent().await[0].text);

        verify_email(&app.state, &token).await.unwrap();
        assert!(matches!(
            verify_email(&app.state, &token).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input_and_duplicates() {
        let app = TestApp::new().await;
        let bad = [
            Registration { email: "nope".into(), ..registration("x") },
            Registration { password: "123".into(), ..registration("a@example.com") },
            Registration { age: 17, ..registration("a@example.com") },
            Registration { name: " ".into(), ..registration("a@example.com") },
        ];
        for registration in bad {
            assert!(matches!(
                register(&app.state, registration).await,
                Err(AppError::Validation(_))
            ));
        }

        register(&app.state, registration("a@example.com")).await.unwrap();
        assert!(matches!(
            register(&app.state, registration("A@EXAMPLE.COM")).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_or_unknown_email() {
        let app = TestApp::new().await;
        let user = register(&app.state, registration("ada@example.com")).await.unwrap();
        app.directory().mark_user_verified(user.id).await.unwrap();

        for (email, password) in [("ada@example.com", "wrong-pass"), ("bob@example.com", "secret123")] {
            match login(&app.state, email, password).await {
                Err(AppError::Validation(msg)) => assert_eq!(msg, BAD_CREDENTIALS),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_password_reset_flow() {
        let app = TestApp::new().await;
        let user = register(&app.state, registration("ada@example.com")).await.unwrap();
        app.directory().mark_user_verified(user.id).await.unwrap();

        assert!(matches!(
            forgot_password(&app.state, "nobody@example.com").await,
            Err(AppError::NotFound(_))
        ));
        forgot_password(&app.state, "ada@example.com").await.unwrap();
        let sent = app.mailer.sent().await;
        let reset_token = token_in(&sent[1].text);

        assert!(reset_password(&app.state, "bogus", "newpass1").await.is_err());
        reset_password(&app.state, &reset_token, "newpass1").await.unwrap();

        login(&app.state, "ada@example.com", "newpass1").await.unwrap();
        assert!(login(&app.state, "ada@example.com", "secret123").await.is_err());
        // Token is consumed
        assert!(reset_password(&app.state, &reset_token, "another1").await.is_err());
    }

    #[tokio::test]
    async fn test_expired_reset_token_is_rejected() {
        let app = TestApp::new().await;
        let user = register(&app.state, registration("ada@example.com")).await.unwrap();
        app.directory()
            .set_reset_token(user.id, "stale", Utc::now() - Duration::minutes(1))
            .await
            .unwrap();

        assert!(matches!(
            reset_password(&app.state, "stale", "newpass1").await,
            Err(AppError::Validation(_))
        ));
    }
}
