use axum::{
    extract::{Query, State},
    response::{Html, Redirect},
    Form,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::auth::{hash_password_blocking, verify_password_blocking};
use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Credentials, User};
use crate::session;
use crate::views;
use crate::AppState;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid username or password.";
pub const USERNAME_TAKEN_MESSAGE: &str = "A user with the given username is already registered.";
pub const MISSING_CREDENTIALS_MESSAGE: &str = "Username and password are required.";
pub const GOOGLE_DISABLED_MESSAGE: &str = "Google sign-in is not configured.";
pub const GOOGLE_FAILED_MESSAGE: &str = "Google sign-in failed. Please try again.";
pub const GOOGLE_EMAIL_TAKEN_MESSAGE: &str =
    "An account with that email already exists. Log in with your password.";

// ============================================================
// Local accounts
// ============================================================

pub async fn login_page(State(state): State<AppState>, session: Session) -> Result<Html<String>> {
    let flashes = session::take_flashes(&session).await?;
    Ok(Html(views::login_page(&flashes, state.google.is_some())))
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(credentials): Form<Credentials>,
) -> Result<Redirect> {
    match authenticate(&state.db, &credentials).await {
        Ok(user) => {
            session::sign_in(&session, user.id).await?;
            tracing::info!("User {} logged in", user.id);
            Ok(Redirect::to("/main"))
        }
        Err(AppError::InvalidCredentials) => {
            tracing::warn!(
                "Failed login for username {:?}",
                credentials.normalized_username()
            );
            session::flash(&session, INVALID_CREDENTIALS_MESSAGE).await?;
            Ok(Redirect::to("/"))
        }
        Err(e) => Err(e),
    }
}

/// Unknown usernames, Google-only accounts and wrong passwords are
/// indistinguishable to the caller.
async fn authenticate(db: &Database, credentials: &Credentials) -> Result<User> {
    let user = db
        .find_user_by_username(credentials.normalized_username())?
        .ok_or(AppError::InvalidCredentials)?;

    let Some(hash) = user.password_hash.clone() else {
        return Err(AppError::InvalidCredentials);
    };

    if verify_password_blocking(credentials.password.clone(), hash).await? {
        Ok(user)
    } else {
        Err(AppError::InvalidCredentials)
    }
}

pub async fn register_page(
    State(state): State<AppState>,
    session: Session,
) -> Result<Html<String>> {
    let flashes = session::take_flashes(&session).await?;
    Ok(Html(views::register_page(&flashes, state.google.is_some())))
}

pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(credentials): Form<Credentials>,
) -> Result<Redirect> {
    if credentials.is_blank() {
        session::flash(&session, MISSING_CREDENTIALS_MESSAGE).await?;
        return Ok(Redirect::to("/register"));
    }

    let username = credentials.normalized_username();
    let hash = hash_password_blocking(credentials.password.clone()).await?;

    match state.db.create_user(username, &hash) {
        Ok(user) => {
            tracing::info!("Registered user {} ({})", user.id, user.username);
            session::sign_in(&session, user.id).await?;
            Ok(Redirect::to("/main"))
        }
        Err(AppError::UsernameTaken) => {
            tracing::warn!("Registration for existing username {:?}", username);
            session::flash(&session, USERNAME_TAKEN_MESSAGE).await?;
            Ok(Redirect::to("/register"))
        }
        Err(e) => Err(e),
    }
}

pub async fn logout(session: Session) -> Result<Redirect> {
    session::sign_out(&session).await?;
    Ok(Redirect::to("/"))
}

// ============================================================
// Google sign-in
// ============================================================

pub async fn google_start(State(state): State<AppState>, session: Session) -> Result<Redirect> {
    let Some(google) = &state.google else {
        session::flash(&session, GOOGLE_DISABLED_MESSAGE).await?;
        return Ok(Redirect::to("/"));
    };

    let pending = google.authorize();
    session::store_pending_oauth(&session, &pending).await?;
    Ok(Redirect::to(&pending.url))
}

/// Query parameters Google appends to the redirect URL.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

pub async fn google_callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<OAuthCallbackQuery>,
) -> Result<Redirect> {
    match complete_google_sign_in(&state, &session, query).await {
        Ok(user) => {
            session::sign_in(&session, user.id).await?;
            tracing::info!("User {} signed in with Google", user.id);
            Ok(Redirect::to("/main"))
        }
        Err(AppError::UsernameTaken) => {
            tracing::warn!("Google email collides with an existing local account");
            session::flash(&session, GOOGLE_EMAIL_TAKEN_MESSAGE).await?;
            Ok(Redirect::to("/"))
        }
        Err(AppError::OAuth(e)) => {
            tracing::warn!("Google sign-in failed: {}", e);
            session::flash(&session, GOOGLE_FAILED_MESSAGE).await?;
            Ok(Redirect::to("/"))
        }
        Err(e) => Err(e),
    }
}

async fn complete_google_sign_in(
    state: &AppState,
    session: &Session,
    query: OAuthCallbackQuery,
) -> Result<User> {
    let google = state
        .google
        .as_ref()
        .ok_or_else(|| AppError::OAuth("Google sign-in is not configured".to_string()))?;

    let pending = session::take_pending_oauth(session)
        .await?
        .ok_or_else(|| AppError::OAuth("No sign-in in progress".to_string()))?;

    if let Some(error) = query.error {
        return Err(AppError::OAuth(format!("Provider returned error: {}", error)));
    }

    let (Some(code), Some(returned_state)) = (query.code, query.state) else {
        return Err(AppError::OAuth("Callback missing code or state".to_string()));
    };

    if returned_state != pending.csrf_state {
        return Err(AppError::OAuth("State mismatch".to_string()));
    }

    let profile = google.exchange_code(&code, pending.pkce_verifier).await?;
    state.db.find_or_create_google_user(&profile)
}
