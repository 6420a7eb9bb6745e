use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

use crate::views;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("OAuth error: {0}")]
    OAuth(String),

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Note limit reached")]
    NoteLimitReached,
}

/// Turn an error that escaped a handler into a page.
///
/// Domain outcomes are normally converted to flash messages by the handlers;
/// reaching this point with one of them still gets a readable response.
/// Infrastructure failures are logged and answered with a generic page.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::UsernameTaken => (StatusCode::CONFLICT, "That username is already taken."),
            AppError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password.")
            }
            AppError::NoteLimitReached => (
                StatusCode::CONFLICT,
                "You already have the maximum number of notes.",
            ),
            ref e => {
                tracing::error!("Internal error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong.")
            }
        };

        (status, Html(views::error_page(status, message))).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
