// Centralized error handling for the portal

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;
use tracing::error;

use crate::views;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("This email address is already registered")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Please log in to access this page")]
    Unauthenticated,

    #[error("An active subscription is required")]
    SubscriptionInactive,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Domain errors are expected outcomes of user input; the rest are faults
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::PasswordHash(_) | AppError::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            // Flashes for these redirects are queued by the guard that raised them
            AppError::Unauthenticated => Redirect::to("/login").into_response(),
            AppError::SubscriptionInactive => Redirect::to("/dashboard").into_response(),
            AppError::DuplicateEmail => {
                (StatusCode::CONFLICT, Html(views::pages::error_page(&self.to_string()))).into_response()
            }
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, Html(views::pages::error_page(&self.to_string()))).into_response()
            }
            AppError::Validation(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(views::pages::error_page(&self.to_string())),
            )
                .into_response(),
            AppError::Database(_) | AppError::PasswordHash(_) | AppError::Internal(_) => {
                error!(error = %self, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(views::pages::error_page("Something went wrong. Please try again later.")),
                )
                    .into_response()
            }
        }
    }
}
