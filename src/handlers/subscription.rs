use crate::core::error::AppError;
use crate::core::state::AppState;
use crate::models::session::FlashLevel;
use crate::security::guard::{ActiveSubscriber, CurrentUser};
use crate::utils::time::format_utc;
use crate::views::{pages, PageContext};
use axum::{
    extract::State,
    response::{Html, Response},
};
use chrono::Utc;
use std::sync::Arc;

/// POST /subscribe
///
/// Always starts a fresh period from now, then returns to the dashboard.
pub async fn subscribe_handler(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Response, AppError> {
    let CurrentUser { user, mut session } = current;

    let end_date = state.subscriptions.subscribe(&user, Utc::now()).await?;

    session.flash(
        &state,
        FlashLevel::Success,
        format!(
            "Thank you for subscribing! You have full access until {}.",
            format_utc(&end_date)
        ),
    );

    Ok(session.redirect("/dashboard"))
}

/// GET /premium-zone
pub async fn premium_zone_handler(
    State(state): State<Arc<AppState>>,
    ActiveSubscriber(current): ActiveSubscriber,
) -> Response {
    let CurrentUser { user, session } = current;

    let flashes = session.take_flashes(&state);
    let ctx = PageContext {
        flashes: &flashes,
        authenticated: true,
    };

    session.respond(Html(pages::premium(&ctx, &user)))
}
