//! Quote of the day.
//!
//! The dashboard shows one quote picked uniformly at random from a remote list.
//! Configuration is via `POCKETDESK_QUOTES_URL` (default:
//! `https://type.fit/api/quotes`), which must serve a JSON array of
//! `{ "text": ..., "author": ... }` objects with a nullable author.

use std::time::Duration;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Attribution suffix type.fit appends to every author.
const ATTRIBUTION_SUFFIX: &str = ", type.fit";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
    #[serde(default)]
    pub author: Option<String>,
}

impl Quote {
    /// Author for display, without the provider's attribution suffix.
    pub fn display_author(&self) -> &str {
        match self.author.as_deref().map(str::trim) {
            Some(author) if !author.is_empty() => {
                let author = author.strip_suffix(ATTRIBUTION_SUFFIX).unwrap_or(author);
                if author.is_empty() || author == "type.fit" {
                    "Unknown"
                } else {
                    author
                }
            }
            _ => "Unknown",
        }
    }
}

/// Shown when the quote provider cannot be reached.
pub fn fallback_quote() -> Quote {
    Quote {
        text: "The secret of getting ahead is getting started.".to_string(),
        author: Some("Mark Twain".to_string()),
    }
}

/// Quote provider errors.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Quote list is empty")]
    Empty,
}

/// Anything that can hand out a random quote.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn random_quote(&self) -> Result<Quote, QuoteError>;
}

/// Pick one quote uniformly at random.
pub fn pick_random(quotes: &[Quote]) -> Option<&Quote> {
    quotes.choose(&mut rand::thread_rng())
}

/// HTTP client for the remote quote list. The list is fetched fresh on every
/// call.
#[derive(Debug, Clone)]
pub struct QuoteClient {
    url: String,
    client: Client,
}

impl QuoteClient {
    pub fn new(url: impl Into<String>) -> Result<Self, QuoteError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub async fn fetch_all(&self) -> Result<Vec<Quote>, QuoteError> {
        let quotes = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<Quote>>()
            .await?;
        Ok(quotes)
    }
}

#[async_trait]
impl QuoteSource for QuoteClient {
    async fn random_quote(&self) -> Result<Quote, QuoteError> {
        let quotes = self.fetch_all().await?;
        pick_random(&quotes).cloned().ok_or(QuoteError::Empty)
    }
}

/// A fixed in-memory quote list.
#[derive(Debug, Clone, Default)]
pub struct StaticQuotes {
    quotes: Vec<Quote>,
}

impl StaticQuotes {
    pub fn new(quotes: Vec<Quote>) -> Self {
        Self { quotes }
    }
}

#[async_trait]
impl QuoteSource for StaticQuotes {
    async fn random_quote(&self) -> Result<Quote, QuoteError> {
        pick_random(&self.quotes).cloned().ok_or(QuoteError::Empty)
    }
}
