use anyhow::Context;

use crate::constants::BCRYPT_COST;
use crate::error::AppResult;

// bcrypt is CPU bound; keep it off the async workers.

pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .context("password hashing task failed")?
        .context("failed to hash password")?;
    Ok(hashed)
}

pub async fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let (password, hash) = (password.to_string(), hash.to_string());
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .context("password verification task failed")?
        // A malformed stored hash never matches.
        .unwrap_or(false);
    Ok(matches)
}
