use crate::core::error::AppError;
use crate::models::user::User;
use crate::stores::user_store::UserStore;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::info;

/// A subscription is active while the flag is set and the end date has not passed.
/// An end date equal to `now` still counts as active.
pub fn is_active(user: &User, now: DateTime<Utc>) -> bool {
    user.is_subscribed
        && user
            .subscription_end_date
            .is_some_and(|end_date| end_date >= now)
}

#[derive(Clone)]
pub struct SubscriptionService {
    users: Arc<UserStore>,
    period: Duration,
}

impl SubscriptionService {
    pub fn new(users: Arc<UserStore>, period_days: u32) -> Self {
        Self {
            users,
            period: Duration::days(i64::from(period_days)),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_active(&self, user: &User, now: DateTime<Utc>) -> bool {
        is_active(user, now)
    }

    /// Start a fresh period from `now`. Remaining time is not carried over.
    pub async fn subscribe(&self, user: &User, now: DateTime<Utc>) -> Result<DateTime<Utc>, AppError> {
        let end_date = now + self.period;

        if !self.users.update_subscription(user.id, true, end_date).await? {
            return Err(AppError::Unauthenticated);
        }

        info!(
            user_id = user.id,
            subscription_end_date = %end_date,
            "Subscription activated"
        );

        Ok(end_date)
    }
}
