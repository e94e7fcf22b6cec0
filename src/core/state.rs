// Application state (AppState)

use crate::core::config::Config;
use crate::services::{auth::AuthService, subscription::SubscriptionService};
use crate::stores::{session_store::SessionStore, user_store::UserStore};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Shared application state
///
/// Passed explicitly to every handler; there is no process-global request state.
#[derive(Clone)]
pub struct AppState {
    /// Persisted user records
    pub users: Arc<UserStore>,

    /// Server-side sessions keyed by cookie id
    pub sessions: Arc<SessionStore>,

    pub auth: AuthService,

    pub subscriptions: SubscriptionService,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, pool: SqlitePool) -> Self {
        let config = Arc::new(config);
        let users = Arc::new(UserStore::new(pool));

        let sessions = Arc::new(SessionStore::new(
            config.session.ttl_seconds,
            config.remember_seconds(),
        ));

        Self {
            auth: AuthService::new(Arc::clone(&users), config.security.bcrypt_cost),
            subscriptions: SubscriptionService::new(Arc::clone(&users), config.subscription.period_days),
            users,
            sessions,
            config,
        }
    }
}
