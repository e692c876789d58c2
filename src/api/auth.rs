//! Authentication API endpoints
//!
//! Handles the Google OAuth sign-in flow and session introspection:
//! - GET /auth/google - Redirect to Google's consent screen
//! - GET /auth/callback - Exchange the authorization code, open a session
//! - POST /auth/logout - Close the session
//! - GET /api/auth/profile - Current user (null when signed out)
//! - GET /api/auth/check - Cookie/session diagnostics
//!
//! The redirect endpoints are browser-facing: every failure path lands
//! back on the homepage with a readable `?error=` message instead of a
//! JSON envelope.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{Session, User};
use crate::services::oauth::GoogleOAuthClient;

/// Query parameters for the sign-in redirect
#[derive(Debug, Deserialize)]
pub struct GoogleAuthQuery {
    /// Opaque client-generated state, round-tripped through Google
    pub state: Option<String>,
}

/// Query parameters Google appends to the callback
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    /// Guest id to merge progress from, when the client passes it along
    pub guest_id: Option<String>,
}

/// Response for the profile endpoint
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: Option<User>,
}

/// Response for the auth-check endpoint.
///
/// Field names match what the web client already reads.
#[derive(Debug, Serialize)]
pub struct AuthCheckResponse {
    #[serde(rename = "hasCookie")]
    pub has_cookie: bool,
    #[serde(rename = "hasSession")]
    pub has_session: bool,
    #[serde(rename = "userId")]
    pub user_id: Option<i64>,
    pub user: Option<AuthCheckUser>,
}

#[derive(Debug, Serialize)]
pub struct AuthCheckUser {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
}

/// Build the browser-facing OAuth router (mounted at /auth)
pub fn redirect_router() -> Router<AppState> {
    Router::new()
        .route("/google", get(google_redirect))
        .route("/callback", get(google_callback))
        .route("/logout", post(logout))
}

/// Build the optional-auth routes (mounted at /api/auth)
pub fn optional_router() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile))
}

/// Build the public auth routes (mounted at /api/auth)
pub fn public_router() -> Router<AppState> {
    Router::new().route("/check", get(auth_check))
}

/// GET /auth/google - Start the Google sign-in flow
///
/// Requires a `state` query parameter; without one the client cannot
/// correlate the callback, so we bounce straight back home.
pub async fn google_redirect(
    State(state): State<AppState>,
    Query(query): Query<GoogleAuthQuery>,
) -> Redirect {
    let oauth_state = match query.state.as_deref() {
        Some(s) if !s.is_empty() => s,
        _ => return home_with_error("Invalid OAuth state"),
    };

    match &state.oauth_client {
        Some(client) => Redirect::to(&client.authorize_url(oauth_state)),
        None => {
            tracing::warn!("Sign-in attempted but Google OAuth is not configured");
            home_with_error("Failed to initiate OAuth")
        }
    }
}

/// GET /auth/callback - Complete the Google sign-in flow
///
/// Exchanges the authorization code, finds or creates the account, merges
/// any guest progress, and sets the session cookie. All failures redirect
/// home with an error message rather than erroring the browser tab.
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    headers: HeaderMap,
) -> Response {
    if let Some(error) = query.error.as_deref() {
        let message = if error == "access_denied" {
            "Access was denied. Please try again."
        } else {
            "An error occurred during authentication."
        };
        tracing::warn!(error, "Google reported an OAuth error");
        return home_with_error(message).into_response();
    }

    let (code, _oauth_state) = match (query.code.as_deref(), query.state.as_deref()) {
        (Some(code), Some(oauth_state)) => (code, oauth_state),
        _ => return home_with_error("Invalid authentication response").into_response(),
    };

    let Some(client) = state.oauth_client.as_ref() else {
        tracing::warn!("OAuth callback hit but Google OAuth is not configured");
        return home_with_error("Authentication failed. Please try again.").into_response();
    };

    let (user, session) = match sign_in(&state, client, code).await {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "OAuth callback failed");
            return home_with_error("Authentication failed. Please try again.").into_response();
        }
    };

    // Guest progress rides in on a query param or the guest_id cookie.
    // A failed merge must not break the sign-in.
    let guest_id = query
        .guest_id
        .clone()
        .or_else(|| cookie_value(&headers, "guest_id"));
    if let Some(guest_id) = guest_id {
        if let Err(e) = state
            .quiz_service
            .merge_guest_progress(&guest_id, user.id)
            .await
        {
            tracing::warn!(user_id = user.id, error = %e, "Guest progress merge failed during sign-in");
        }
    }

    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id,
        state.session_days * 24 * 60 * 60
    );

    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_str(&cookie).unwrap());

    (response_headers, Redirect::to("/")).into_response()
}

/// POST /auth/logout - Close the current session
///
/// Deletes the session row when a token is present and always clears the
/// cookie, so logging out an already signed-out browser is a no-op.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = token_from_headers(&headers) {
        state
            .user_service
            .logout(&token)
            .await
            .map_err(|e| ApiError::internal_error(e.to_string()))?;
    }

    let clear_cookie = "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0";
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::SET_COOKIE, HeaderValue::from_static(clear_cookie));

    Ok((StatusCode::NO_CONTENT, response_headers))
}

/// GET /api/auth/profile - Current user
///
/// Returns `{"user": null}` for signed-out callers so the homepage can
/// render its login affordance without a 401 round trip.
pub async fn get_profile(user: Option<AuthenticatedUser>) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        user: user.map(|u| u.0),
    })
}

/// GET /api/auth/check - Cookie and session diagnostics
pub async fn auth_check(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AuthCheckResponse>, ApiError> {
    let has_cookie = headers.get(header::COOKIE).is_some();

    let user = match token_from_headers(&headers) {
        Some(token) => state
            .user_service
            .validate_session(&token)
            .await
            .map_err(|e| ApiError::internal_error(e.to_string()))?,
        None => None,
    };

    Ok(Json(AuthCheckResponse {
        has_cookie,
        has_session: user.is_some(),
        user_id: user.as_ref().map(|u| u.id),
        user: user.map(|u| AuthCheckUser {
            id: u.id,
            email: u.email,
            name: u.name,
            role: u.role.to_string(),
        }),
    }))
}

/// Exchange the code for a profile and open a session
async fn sign_in(
    state: &AppState,
    client: &GoogleOAuthClient,
    code: &str,
) -> anyhow::Result<(User, Session)> {
    let access_token = client.exchange_code(code).await?;
    let profile = client.fetch_profile(&access_token).await?;
    let (user, session) = state.user_service.login_with_google(&profile).await?;
    Ok((user, session))
}

/// Redirect home with a URL-encoded error message
fn home_with_error(message: &str) -> Redirect {
    Redirect::to(&format!("/?error={}", urlencoding::encode(message)))
}

/// Session token from headers: `Authorization: Bearer` wins over the cookie
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    cookie_value(headers, "session")
}

/// One cookie's value out of the Cookie header
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for cookie in cookie_header.split(';') {
        let cookie = cookie.trim();
        if let Some(value) = cookie.strip_prefix(name) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value.to_string());
            }
        }
    }
    None
}

// ============================================================================
// Tests
// ============================================================================
