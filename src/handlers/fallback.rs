use crate::security::session::SessionContext;
use crate::views::{pages, PageContext};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

/// Unmatched routes get an HTML 404; pending flashes stay queued for the next real page
pub async fn fallback_handler(session: SessionContext) -> Response {
    let ctx = PageContext {
        flashes: &[],
        authenticated: session.is_authenticated(),
    };

    (StatusCode::NOT_FOUND, Html(pages::not_found(&ctx))).into_response()
}
