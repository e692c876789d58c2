//! Google OAuth2 client
//!
//! Thin client for the three Google endpoints the sign-in flow touches:
//! the consent-screen redirect URL, the code-for-token exchange, and the
//! userinfo fetch. Session creation and account linking live in
//! [`super::user::UserService`]; this module only talks to Google.

use crate::config::OAuthConfig;
use serde::Deserialize;
use std::time::Duration;

/// Google's OAuth2 consent screen
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Authorization-code exchange endpoint
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Profile endpoint, requires a Bearer access token
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Scopes requested at the consent screen
const GOOGLE_SCOPES: &str = "openid email profile";

/// Error types for OAuth operations
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// Client id/secret missing from configuration
    #[error("Google OAuth is not configured")]
    NotConfigured,

    /// Network or protocol failure talking to Google
    #[error("OAuth request failed: {0}")]
    RequestFailed(String),

    /// Google answered with a non-success status
    #[error("Google rejected the request: {0}")]
    ProviderError(String),
}

/// Profile payload returned by Google's userinfo endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleProfile {
    /// Stable Google account id
    pub id: String,
    /// Email address
    pub email: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub picture: Option<String>,
    /// Whether Google has verified the email
    #[serde(default)]
    pub verified_email: bool,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Google OAuth2 client bound to one app registration
pub struct GoogleOAuthClient {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    http: reqwest::Client,
}

impl GoogleOAuthClient {
    /// Create a client from configuration
    ///
    /// Fails with `NotConfigured` when the client id or secret is empty so
    /// the server can start without credentials and reject sign-in attempts
    /// with a clear message instead of opaque Google errors.
    pub fn new(config: &OAuthConfig) -> Result<Self, OAuthError> {
        if !config.is_configured() {
            return Err(OAuthError::NotConfigured);
        }

        let http = reqwest::Client::builder()
            .user_agent("Pariksha-Hub")
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| OAuthError::RequestFailed(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            http,
        })
    }

    /// Build the consent-screen URL carrying the caller's `state`
    ///
    /// The state is generated and later verified by the browser side; the
    /// server reflects it to Google unchanged.
    pub fn authorize_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline&prompt=consent",
            GOOGLE_AUTH_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(GOOGLE_SCOPES),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for an access token
    pub async fn exchange_code(&self, code: &str) -> Result<String, OAuthError> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];

        let response = self
            .http
            .post(GOOGLE_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .map_err(|e| OAuthError::RequestFailed(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(OAuthError::ProviderError(format!(
                "token exchange returned {}",
                response.status()
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::RequestFailed(format!("Invalid token response: {}", e)))?;

        Ok(token.access_token)
    }

    /// Fetch the signed-in user's Google profile
    pub async fn fetch_profile(&self, access_token: &str) -> Result<GoogleProfile, OAuthError> {
        let response = self
            .http
            .get(GOOGLE_USERINFO_URL)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| OAuthError::RequestFailed(format!("Userinfo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(OAuthError::ProviderError(format!(
                "userinfo returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::RequestFailed(format!("Invalid userinfo response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> OAuthConfig {
        OAuthConfig {
            google_client_id: "client-123.apps.googleusercontent.com".to_string(),
            google_client_secret: "shhh".to_string(),
            redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            session_days: 7,
        }
    }

    #[test]
    fn test_authorize_url_carries_state_and_scopes() {
        let client = GoogleOAuthClient::new(&test_config()).expect("Failed to build client");

        let url = client.authorize_url("abc123");

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=client-123.apps.googleusercontent.com"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A3000%2Fauth%2Fcallback"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=openid%20email%20profile"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
    }

    #[test]
    fn test_authorize_url_encodes_state() {
        let client = GoogleOAuthClient::new(&test_config()).expect("Failed to build client");

        let url = client.authorize_url("a b&c");

        assert!(url.contains("state=a%20b%26c"));
        assert!(!url.contains("state=a b&c"));
    }

    #[test]
    fn test_unconfigured_client_is_rejected() {
        let config = OAuthConfig {
            google_client_id: String::new(),
            google_client_secret: String::new(),
            redirect_uri: "http://localhost:3000/auth/callback".to_string(),
            session_days: 7,
        };

        let result = GoogleOAuthClient::new(&config);

        assert!(matches!(result, Err(OAuthError::NotConfigured)));
    }

    #[test]
    fn test_profile_deserializes_google_payload() {
        let json = r#"{
            "id": "108634567890",
            "email": "aspirant@example.com",
            "verified_email": true,
            "name": "Aspirant Kumar",
            "picture": "https://lh3.googleusercontent.com/a/photo"
        }"#;

        let profile: GoogleProfile = serde_json::from_str(json).expect("Failed to parse profile");

        assert_eq!(profile.id, "108634567890");
        assert_eq!(profile.email, "aspirant@example.com");
        assert_eq!(profile.name.as_deref(), Some("Aspirant Kumar"));
        assert!(profile.verified_email);
    }

    #[test]
    fn test_profile_tolerates_missing_optional_fields() {
        let json = r#"{"id": "1", "email": "a@b.com"}"#;

        let profile: GoogleProfile = serde_json::from_str(json).expect("Failed to parse profile");

        assert!(profile.name.is_none());
        assert!(profile.picture.is_none());
        assert!(!profile.verified_email);
    }
}
