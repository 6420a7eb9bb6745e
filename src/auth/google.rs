//! # Google OAuth 2.0 sign-in
//!
//! Authorization Code flow with PKCE.
//!
//! 1. [`GoogleOAuth::authorize`] builds the consent URL requesting `openid`,
//!    `email` and `profile`, with a random CSRF state and PKCE challenge. The
//!    caller keeps the state and verifier in the user's session.
//! 2. [`GoogleOAuth::exchange_code`] trades the returned code (plus verifier)
//!    for an access token and fetches the userinfo profile. Account lookup is
//!    left to [`crate::db::Database::find_or_create_google_user`].

use oauth2::basic::BasicClient;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    PkceCodeChallenge, PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use serde::{Deserialize, Serialize};

use crate::config::GoogleConfig;
use crate::error::{AppError, Result};
use crate::models::GoogleProfile;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Google userinfo response.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    id: String,
    email: String,
}

/// OAuth client type with auth URL and token URL set.
type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// Where the authorization, token and userinfo requests go.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            userinfo_url: GOOGLE_USERINFO_URL.to_string(),
        }
    }
}

/// A pending authorization: where to send the browser, and what to remember
/// until the callback arrives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAuthorization {
    pub url: String,
    pub csrf_state: String,
    pub pkce_verifier: String,
}

pub struct GoogleOAuth {
    client: ConfiguredClient,
    http: reqwest::Client,
    userinfo_url: String,
}

impl GoogleOAuth {
    pub fn new(config: &GoogleConfig) -> Result<Self> {
        Self::with_endpoints(config, GoogleEndpoints::default())
    }

    pub fn with_endpoints(config: &GoogleConfig, endpoints: GoogleEndpoints) -> Result<Self> {
        let client = BasicClient::new(ClientId::new(config.client_id.clone()))
            .set_client_secret(ClientSecret::new(config.client_secret.clone()))
            .set_auth_uri(AuthUrl::new(endpoints.auth_url).map_err(oauth_error)?)
            .set_token_uri(TokenUrl::new(endpoints.token_url).map_err(oauth_error)?)
            .set_redirect_uri(RedirectUrl::new(config.redirect_url.clone()).map_err(oauth_error)?);

        // Token endpoint responses must not be followed as redirects.
        let http = reqwest::ClientBuilder::new()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(oauth_error)?;

        Ok(Self {
            client,
            http,
            userinfo_url: endpoints.userinfo_url,
        })
    }

    pub fn authorize(&self) -> PendingAuthorization {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let (auth_url, csrf_state) = self
            .client
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
            .set_pkce_challenge(pkce_challenge)
            .url();

        PendingAuthorization {
            url: auth_url.to_string(),
            csrf_state: csrf_state.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        }
    }

    pub async fn exchange_code(&self, code: &str, pkce_verifier: String) -> Result<GoogleProfile> {
        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier))
            .request_async(&self.http)
            .await
            .map_err(|e| AppError::OAuth(format!("Token exchange failed: {}", e)))?;

        let info: GoogleUserInfo = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(token.access_token().secret())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(oauth_error)?
            .json()
            .await
            .map_err(oauth_error)?;

        Ok(GoogleProfile {
            id: info.id,
            email: info.email,
        })
    }
}

fn oauth_error(e: impl std::fmt::Display) -> AppError {
    AppError::OAuth(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GoogleConfig {
        GoogleConfig {
            client_id: "client-123".to_string(),
            client_secret: "shh".to_string(),
            redirect_url: "http://localhost:3000/auth/google/main".to_string(),
        }
    }

    #[test]
    fn authorize_url_carries_client_scopes_and_state() {
        let oauth = GoogleOAuth::new(&config()).unwrap();
        let pending = oauth.authorize();

        assert!(pending.url.starts_with(GOOGLE_AUTH_URL));
        assert!(pending.url.contains("client_id=client-123"));
        assert!(pending.url.contains("code_challenge_method=S256"));
        assert!(pending.url.contains("openid"));
        assert!(pending.url.contains(&format!("state={}", pending.csrf_state)));
        assert!(!pending.pkce_verifier.is_empty());
    }

    #[test]
    fn each_authorization_gets_fresh_state() {
        let oauth = GoogleOAuth::new(&config()).unwrap();
        assert_ne!(oauth.authorize().csrf_state, oauth.authorize().csrf_state);
    }

    #[test]
    fn invalid_redirect_url_is_rejected() {
        let mut bad = config();
        bad.redirect_url = "not a url".to_string();
        assert!(matches!(GoogleOAuth::new(&bad), Err(AppError::OAuth(_))));
    }
}
