// Route guards, applied per handler as extractors

use crate::core::error::AppError;
use crate::core::state::AppState;
use crate::models::session::FlashLevel;
use crate::models::user::User;
use crate::security::session::SessionContext;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, Method},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

pub const LOGIN_REQUIRED_MESSAGE: &str = "Please log in to access this page.";
pub const SUBSCRIPTION_REQUIRED_MESSAGE: &str =
    "You need an active subscription to enter the premium zone.";

/// A logged-in user whose record still exists.
///
/// Rejects with a redirect to `/login`, remembering the requested page for GETs.
pub struct CurrentUser {
    pub user: User,
    pub session: SessionContext,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let mut session = SessionContext::resolve(&parts.headers, state);

        if let Some(user_id) = session.user_id {
            match state.users.find_by_id(user_id).await {
                Ok(Some(user)) => return Ok(CurrentUser { user, session }),
                Ok(None) => {
                    warn!(user_id, "Session refers to a missing user, logging out");
                    session.logout(state);
                }
                Err(e) => return Err(AppError::from(e).into_response()),
            }
        }

        debug!(path = %parts.uri.path(), "Unauthenticated access to protected route");

        session.flash(state, FlashLevel::Info, LOGIN_REQUIRED_MESSAGE);

        // Only GETs are worth returning to after login
        if parts.method != Method::GET {
            return Err(session.respond(AppError::Unauthenticated));
        }

        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        Err(session.redirect(&login_location(Some(target))))
    }
}

/// A logged-in user with an active subscription; otherwise back to the dashboard
pub struct ActiveSubscriber(pub CurrentUser);

impl FromRequestParts<Arc<AppState>> for ActiveSubscriber {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let mut current = CurrentUser::from_request_parts(parts, state).await?;

        if state.subscriptions.is_active(&current.user, Utc::now()) {
            return Ok(ActiveSubscriber(current));
        }

        debug!(user_id = current.user.id, "Subscription inactive, access denied");

        current
            .session
            .flash(state, FlashLevel::Warning, SUBSCRIPTION_REQUIRED_MESSAGE);
        Err(current.session.respond(AppError::SubscriptionInactive))
    }
}

pub fn login_location(next: Option<&str>) -> String {
    match next {
        Some(next) => match serde_urlencoded::to_string(&[("next", next)]) {
            Ok(query) => format!("/login?{}", query),
            Err(_) => "/login".to_string(),
        },
        None => "/login".to_string(),
    }
}
