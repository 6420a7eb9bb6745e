//! PocketDesk: a personal to-do list and notes web app.
//!
//! Users sign in with a username/password or with Google, keep a to-do list
//! and up to three notes, and get a random quote on their dashboard.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod quotes;
pub mod session;
pub mod views;

pub use config::Config;
pub use db::Database;
pub use error::{AppError, Result};

use std::sync::Arc;

use auth::GoogleOAuth;
use quotes::{QuoteClient, QuoteSource};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<Config>,
    pub quotes: Arc<dyn QuoteSource>,
    /// Present only when Google credentials are configured.
    pub google: Option<Arc<GoogleOAuth>>,
}

impl AppState {
    /// Wire up state from configuration: the quote client points at the
    /// configured URL and Google sign-in is enabled if credentials are set.
    pub fn new(db: Database, config: Config) -> anyhow::Result<Self> {
        let quotes = QuoteClient::new(config.quotes_url.clone())?;
        let google = config
            .google
            .as_ref()
            .map(GoogleOAuth::new)
            .transpose()?
            .map(Arc::new);

        Ok(Self {
            db,
            config: Arc::new(config),
            quotes: Arc::new(quotes),
            google,
        })
    }

    /// Replace the Google sign-in client.
    pub fn with_google(mut self, google: GoogleOAuth) -> Self {
        self.google = Some(Arc::new(google));
        self
    }

    /// Replace the quote provider.
    pub fn with_quotes(mut self, quotes: Arc<dyn QuoteSource>) -> Self {
        self.quotes = quotes;
        self
    }
}
