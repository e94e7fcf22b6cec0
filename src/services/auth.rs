use crate::core::error::AppError;
use crate::models::user::{NewUser, User};
use crate::security::password::{hash_password, verify_password};
use crate::stores::user_store::{is_unique_violation, UserStore};
use std::sync::Arc;
use tracing::{debug, info};

/// Registration and credential checks. Session handling lives with the handlers.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<UserStore>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(users: Arc<UserStore>, bcrypt_cost: u32) -> Self {
        Self { users, bcrypt_cost }
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<User, AppError> {
        if self.users.email_exists(email).await? {
            debug!("Registration rejected, email already registered");
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;

        let user = self
            .users
            .insert(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| {
                // Lost a race with a concurrent registration for the same email
                if is_unique_violation(&e) {
                    AppError::DuplicateEmail
                } else {
                    AppError::Database(e)
                }
            })?;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let Some(user) = self.users.find_by_email(email).await? else {
            debug!("Login failed, unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash).await? {
            debug!(user_id = user.id, "Login failed, wrong password");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::startup::connect_in_memory;

    async fn service() -> (AuthService, Arc<UserStore>) {
        let users = Arc::new(UserStore::new(connect_in_memory().await.unwrap()));
        (AuthService::new(Arc::clone(&users), 4), users)
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (auth, users) = service().await;

        let user = auth.register("alice", "a@x.com", "secret1").await.unwrap();

        let stored = users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.username, "alice");
        assert_ne!(stored.password_hash, "secret1");
        assert!(!stored.is_subscribed);
        assert!(stored.subscription_end_date.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_creates_no_record() {
        let (auth, users) = service().await;

        auth.register("alice", "a@x.com", "secret1").await.unwrap();
        let result = auth.register("alice2", "a@x.com", "other-password").await;

        assert!(matches!(result, Err(AppError::DuplicateEmail)));
        assert_eq!(users.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_same_username_different_email_is_allowed() {
        let (auth, users) = service().await;

        auth.register("alice", "a@x.com", "secret1").await.unwrap();
        auth.register("alice", "b@x.com", "secret1").await.unwrap();

        assert_eq!(users.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_authenticate_with_registered_password() {
        let (auth, _) = service().await;
        let registered = auth.register("alice", "a@x.com", "secret1").await.unwrap();

        let user = auth.authenticate("a@x.com", "secret1").await.unwrap();
        assert_eq!(user.id, registered.id);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_other_passwords() {
        let (auth, _) = service().await;
        auth.register("alice", "a@x.com", "secret1").await.unwrap();

        for wrong in ["secret2", "Secret1", "secret1 ", ""] {
            let result = auth.authenticate("a@x.com", wrong).await;
            assert!(matches!(result, Err(AppError::InvalidCredentials)), "accepted {wrong:?}");
        }
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email() {
        let (auth, _) = service().await;

        let result = auth.authenticate("nobody@x.com", "secret1").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }
}
