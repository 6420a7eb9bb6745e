use std::path::PathBuf;

/// Default quote API, a JSON array of `{ "text": ..., "author": ... }`.
pub const DEFAULT_QUOTES_URL: &str = "https://type.fit/api/quotes";

/// Default OAuth callback for local development.
pub const DEFAULT_GOOGLE_REDIRECT_URL: &str = "http://localhost:3000/auth/google/main";

/// Minimum length of a configured session signing secret.
pub const MIN_SESSION_SECRET_BYTES: usize = 64;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Database file; `None` means the platform data directory.
    pub database_path: Option<PathBuf>,
    pub session: SessionConfig,
    pub quotes_url: String,
    /// Google sign-in is disabled when unset.
    pub google: Option<GoogleConfig>,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Cookie signing secret; a random key is generated per process when unset.
    pub secret: Option<String>,
    /// Mark the cookie `Secure` (HTTPS only).
    pub secure: bool,
    /// Sessions expire after this many days of inactivity.
    pub inactivity_days: i64,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let host = var("POCKETDESK_HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = var("POCKETDESK_PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .map_err(|_| "Invalid POCKETDESK_PORT")?;

        let database_path = var("POCKETDESK_DATABASE_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let secret = var("POCKETDESK_SESSION_SECRET").filter(|s| !s.is_empty());
        if let Some(secret) = &secret {
            if secret.len() < MIN_SESSION_SECRET_BYTES {
                return Err(format!(
                    "POCKETDESK_SESSION_SECRET must be at least {} bytes",
                    MIN_SESSION_SECRET_BYTES
                ));
            }
        }

        let secure = match var("POCKETDESK_SESSION_SECURE").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(_) => return Err("Invalid POCKETDESK_SESSION_SECURE".to_string()),
        };

        let inactivity_days: i64 = var("POCKETDESK_SESSION_DAYS")
            .unwrap_or_else(|| "7".to_string())
            .parse()
            .map_err(|_| "Invalid POCKETDESK_SESSION_DAYS")?;
        if inactivity_days <= 0 {
            return Err("POCKETDESK_SESSION_DAYS must be positive".to_string());
        }

        let quotes_url =
            var("POCKETDESK_QUOTES_URL").unwrap_or_else(|| DEFAULT_QUOTES_URL.to_string());

        let google = match (var("GOOGLE_CLIENT_ID"), var("GOOGLE_CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_url: var("GOOGLE_REDIRECT_URL")
                    .unwrap_or_else(|| DEFAULT_GOOGLE_REDIRECT_URL.to_string()),
            }),
            (None, None) => None,
            _ => {
                return Err(
                    "GOOGLE_CLIENT_ID and GOOGLE_CLIENT_SECRET must be set together".to_string(),
                )
            }
        };

        Ok(Config {
            host,
            port,
            database_path,
            session: SessionConfig {
                secret,
                secure,
                inactivity_days,
            },
            quotes_url,
            google,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_path: None,
            session: SessionConfig {
                secret: None,
                secure: false,
                inactivity_days: 7,
            },
            quotes_url: DEFAULT_QUOTES_URL.to_string(),
            google: None,
        }
    }
}
