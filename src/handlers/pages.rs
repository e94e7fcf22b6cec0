use crate::core::state::AppState;
use crate::security::session::SessionContext;
use crate::views::{pages, PageContext};
use axum::{
    extract::State,
    response::{Html, Response},
};
use std::sync::Arc;

/// GET /
pub async fn index_handler(State(state): State<Arc<AppState>>, session: SessionContext) -> Response {
    let flashes = session.take_flashes(&state);
    let ctx = PageContext {
        flashes: &flashes,
        authenticated: session.is_authenticated(),
    };
    let html = pages::index(&ctx);

    session.respond(Html(html))
}
