use crate::core::error::AppError;
use anyhow::anyhow;

/// Hash with bcrypt on the blocking pool; the work factor makes this deliberately slow.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();

    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(anyhow!("password hashing task failed: {e}")))?
        .map_err(AppError::from)
}

/// Constant-time comparison is done by bcrypt itself
pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let hash = hash.to_owned();

    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(anyhow!("password verification task failed: {e}")))?
        .map_err(AppError::from)
}
