use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account.
///
/// Local accounts carry a password hash; accounts created through Google
/// sign-in carry a `google_id` and use the Google email as their username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Argon2id PHC string. `None` for Google-only accounts.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub google_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Username/password pair submitted by the login and registration forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// The username with surrounding whitespace removed.
    pub fn normalized_username(&self) -> &str {
        self.username.trim()
    }

    pub fn is_blank(&self) -> bool {
        self.normalized_username().is_empty() || self.password.is_empty()
    }
}

/// The subset of a Google userinfo profile needed for find-or-create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleProfile {
    /// Stable Google account id.
    pub id: String,
    pub email: String,
}
