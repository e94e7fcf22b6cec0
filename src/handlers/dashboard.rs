use crate::core::state::AppState;
use crate::security::guard::CurrentUser;
use crate::views::{pages, PageContext};
use axum::{
    extract::State,
    response::{Html, Response},
};
use chrono::Utc;
use std::sync::Arc;

/// GET /dashboard
pub async fn dashboard_handler(State(state): State<Arc<AppState>>, current: CurrentUser) -> Response {
    let CurrentUser { user, session } = current;

    let flashes = session.take_flashes(&state);
    let ctx = PageContext {
        flashes: &flashes,
        authenticated: true,
    };
    let html = pages::dashboard(&ctx, &user, Utc::now());

    session.respond(Html(html))
}
