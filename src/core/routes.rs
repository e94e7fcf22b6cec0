// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{auth, dashboard, fallback, health, pages, subscription};
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Public pages
        .route("/", get(pages::index_handler))
        .route("/register", get(auth::register_form_handler).post(auth::register_handler))
        .route("/login", get(auth::login_form_handler).post(auth::login_handler))
        .route("/health", get(health::health_handler))

        // Require a logged-in user
        .route("/logout", get(auth::logout_handler))
        .route("/dashboard", get(dashboard::dashboard_handler))
        .route("/subscribe", post(subscription::subscribe_handler))

        // Require an active subscription
        .route("/premium-zone", get(subscription::premium_zone_handler))

        .fallback(fallback::fallback_handler)

        .with_state(state)
}
