//! Session cookie layer and the values PocketDesk keeps in a session.
//!
//! A session holds at most: the signed-in user's id, pending flash messages,
//! and the CSRF state/PKCE verifier of an in-flight Google sign-in.

use tower_sessions::cookie::{time::Duration, Key, SameSite};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use uuid::Uuid;

use crate::auth::PendingAuthorization;
use crate::config::SessionConfig;
use crate::error::Result;

pub const SESSION_COOKIE_NAME: &str = "pocketdesk.sid";

const USER_ID_KEY: &str = "user_id";
const FLASH_KEY: &str = "flash";
const OAUTH_KEY: &str = "google_oauth";

/// Build the cookie-backed session layer.
pub fn session_layer(config: &SessionConfig) -> SessionManagerLayer<MemoryStore, SignedCookie> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(config.secure)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::days(config.inactivity_days)))
        .with_signed(signing_key(config))
}

fn signing_key(config: &SessionConfig) -> Key {
    match &config.secret {
        Some(secret) => Key::try_from(secret.as_bytes()).unwrap_or_else(|e| {
            tracing::warn!("Unusable session secret ({}), using a random key", e);
            Key::generate()
        }),
        None => {
            tracing::info!("No session secret configured, sessions will not survive a restart");
            Key::generate()
        }
    }
}

/// Bind the session to `user_id`, issuing a fresh session id.
pub async fn sign_in(session: &Session, user_id: Uuid) -> Result<()> {
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user_id).await?;
    Ok(())
}

pub async fn current_user_id(session: &Session) -> Result<Option<Uuid>> {
    Ok(session.get::<Uuid>(USER_ID_KEY).await?)
}

/// Drop the session record and clear the cookie.
pub async fn sign_out(session: &Session) -> Result<()> {
    session.flush().await?;
    Ok(())
}

/// Queue a one-time message for the next rendered page.
pub async fn flash(session: &Session, message: impl Into<String>) -> Result<()> {
    let mut messages: Vec<String> = session.get(FLASH_KEY).await?.unwrap_or_default();
    messages.push(message.into());
    session.insert(FLASH_KEY, messages).await?;
    Ok(())
}

/// Remove and return all queued flash messages.
pub async fn take_flashes(session: &Session) -> Result<Vec<String>> {
    Ok(session
        .remove::<Vec<String>>(FLASH_KEY)
        .await?
        .unwrap_or_default())
}

pub async fn store_pending_oauth(session: &Session, pending: &PendingAuthorization) -> Result<()> {
    session.insert(OAUTH_KEY, pending).await?;
    Ok(())
}

/// The in-flight Google authorization, if any. Consumed on read so a state
/// value can only be redeemed once.
pub async fn take_pending_oauth(session: &Session) -> Result<Option<PendingAuthorization>> {
    Ok(session.remove::<PendingAuthorization>(OAUTH_KEY).await?)
}
