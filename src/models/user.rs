use chrono::{DateTime, Utc};

#[derive(Clone, sqlx::FromRow)]
pub struct User {
    /// Primary key, assigned by the database
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt hash including its salt
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub is_subscribed: bool,
    pub subscription_end_date: Option<DateTime<Utc>>,
}

/// A user that has not been persisted yet
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("is_subscribed", &self.is_subscribed)
            .field("subscription_end_date", &self.subscription_end_date)
            .finish()
    }
}
