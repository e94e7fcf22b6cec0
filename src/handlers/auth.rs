use crate::core::error::AppError;
use crate::core::state::AppState;
use crate::models::forms::{field_messages, FieldErrors, LoginForm, LoginQuery, RegisterForm};
use crate::models::session::{Flash, FlashLevel};
use crate::security::guard::CurrentUser;
use crate::security::session::SessionContext;
use crate::views::{pages, PageContext};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Response},
    Form,
};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

/// GET /register
pub async fn register_form_handler(State(state): State<Arc<AppState>>, session: SessionContext) -> Response {
    if session.is_authenticated() {
        return session.redirect("/dashboard");
    }

    let flashes = session.take_flashes(&state);
    let ctx = PageContext {
        flashes: &flashes,
        authenticated: false,
    };
    let html = pages::register(&ctx, "", "", &FieldErrors::new());

    session.respond(Html(html))
}

/// POST /register
///
/// Invalid input re-renders the form; a taken email bounces back with a flash.
#[instrument(skip_all)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    mut session: SessionContext,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if session.is_authenticated() {
        return Ok(session.redirect("/dashboard"));
    }

    let form = form.normalized();

    let result = match form.validate() {
        Ok(()) => {
            state
                .auth
                .register(&form.username, &form.email, &form.password)
                .await
        }
        Err(errors) => Err(AppError::from(errors)),
    };

    match result {
        Ok(_) => {
            session.flash(&state, FlashLevel::Success, "Registration successful. Please log in.");
            Ok(session.redirect("/login"))
        }
        Err(AppError::Validation(errors)) => {
            let flashes = session.take_flashes(&state);
            let ctx = PageContext {
                flashes: &flashes,
                authenticated: false,
            };
            let html = pages::register(&ctx, &form.username, &form.email, &field_messages(&errors));

            Ok(session.respond((StatusCode::UNPROCESSABLE_ENTITY, Html(html))))
        }
        Err(AppError::DuplicateEmail) => {
            session.flash(&state, FlashLevel::Danger, "This email address is already registered.");
            Ok(session.redirect("/register"))
        }
        Err(e) => Err(e),
    }
}

/// GET /login
pub async fn login_form_handler(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Query(query): Query<LoginQuery>,
) -> Response {
    if session.is_authenticated() {
        return session.redirect("/dashboard");
    }

    let flashes = session.take_flashes(&state);
    let ctx = PageContext {
        flashes: &flashes,
        authenticated: false,
    };
    let html = pages::login(&ctx, "", query.safe_next(), &FieldErrors::new());

    session.respond(Html(html))
}

/// POST /login
///
/// On success the session id is rotated and bound to the user. A local `next`
/// path is honoured; anything else lands on the dashboard.
#[instrument(skip_all)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    mut session: SessionContext,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if session.is_authenticated() {
        return Ok(session.redirect("/dashboard"));
    }

    let form = form.normalized();

    let result = match form.validate() {
        Ok(()) => state.auth.authenticate(&form.email, &form.password).await,
        Err(errors) => Err(AppError::from(errors)),
    };

    match result {
        Ok(user) => {
            let remember = form.remember();
            session.login(&state, user.id, remember);
            session.flash(&state, FlashLevel::Success, "Login successful.");

            info!(user_id = user.id, remember, "User logged in");

            let target = query.safe_next().unwrap_or("/dashboard");
            Ok(session.redirect(target))
        }
        Err(AppError::Validation(errors)) => {
            let flashes = session.take_flashes(&state);
            let ctx = PageContext {
                flashes: &flashes,
                authenticated: false,
            };
            let html = pages::login(&ctx, &form.email, query.safe_next(), &field_messages(&errors));

            Ok(session.respond((StatusCode::UNPROCESSABLE_ENTITY, Html(html))))
        }
        Err(AppError::InvalidCredentials) => {
            let mut flashes = session.take_flashes(&state);
            flashes.push(Flash::new(FlashLevel::Danger, "Invalid email or password."));
            let ctx = PageContext {
                flashes: &flashes,
                authenticated: false,
            };
            let html = pages::login(&ctx, &form.email, query.safe_next(), &FieldErrors::new());

            Ok(session.respond((StatusCode::UNAUTHORIZED, Html(html))))
        }
        Err(e) => Err(e),
    }
}

/// GET /logout
pub async fn logout_handler(State(state): State<Arc<AppState>>, current: CurrentUser) -> Response {
    let CurrentUser { user, mut session } = current;

    session.logout(&state);
    session.flash(&state, FlashLevel::Info, "You have been logged out.");

    info!(user_id = user.id, "User logged out");

    session.redirect("/")
}
