//! User service
//!
//! Business logic for Google sign-in accounts:
//! - Find-or-create from an OAuth profile, linking pre-existing email accounts
//! - First sign-in ever becomes the administrator
//! - Session lifecycle: create, validate, logout, expired-session sweep

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{CreateUserInput, Session, User, UserRole};
use crate::services::oauth::GoogleProfile;
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Sign-in could not be completed
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// User service for accounts and sessions
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    /// Create a new user service with the given repositories
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a new user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Complete a Google sign-in: find or create the account and open a session
    ///
    /// Resolution order:
    /// 1. An account already linked to this Google id signs straight in; its
    ///    name and avatar are refreshed from the profile.
    /// 2. An account with the same email gets the Google id linked to it.
    /// 3. Otherwise a new account is created. The very first account in the
    ///    system is made an administrator.
    ///
    /// `last_login_at` is stamped on every path.
    ///
    /// # Errors
    ///
    /// - `AuthenticationError` if the profile carries no email
    /// - `InternalError` for database errors
    pub async fn login_with_google(
        &self,
        profile: &GoogleProfile,
    ) -> Result<(User, Session), UserServiceError> {
        if profile.email.trim().is_empty() {
            return Err(UserServiceError::AuthenticationError(
                "Google profile has no email address".to_string(),
            ));
        }

        let user = self.find_or_create_user(profile).await?;

        self.user_repo
            .record_login(user.id)
            .await
            .context("Failed to record login")?;

        let session = self.create_session(user.id).await?;

        tracing::info!(user_id = user.id, email = %user.email, "User signed in via Google");

        Ok((user, session))
    }

    /// Logout (invalidate session)
    ///
    /// Deletes the session from the database, effectively logging out the user.
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        let user = self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?;

        Ok(user)
    }

    /// Validate session token and return the associated user
    ///
    /// Checks if the session exists and is not expired. If valid, returns
    /// the associated user. An expired session is deleted on the spot so the
    /// next lookup misses cleanly.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Delete all expired sessions
    ///
    /// Maintenance operation called periodically by the background sweep.
    ///
    /// # Returns
    ///
    /// The number of sessions deleted
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        let count = self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?;

        Ok(count)
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    /// Resolve an OAuth profile to an account, creating one if needed
    async fn find_or_create_user(
        &self,
        profile: &GoogleProfile,
    ) -> Result<User, UserServiceError> {
        // Already linked to this Google account
        if let Some(mut user) = self
            .user_repo
            .get_by_google_id(&profile.id)
            .await
            .context("Failed to get user by Google id")?
        {
            user.name = profile.name.clone().or(user.name);
            user.avatar = profile.picture.clone().or(user.avatar);
            let updated = self
                .user_repo
                .update(&user)
                .await
                .context("Failed to refresh user profile")?;
            return Ok(updated);
        }

        // Same email registered before this Google account was seen
        if let Some(mut user) = self
            .user_repo
            .get_by_email(&profile.email)
            .await
            .context("Failed to get user by email")?
        {
            user.google_id = Some(profile.id.clone());
            user.avatar = profile.picture.clone().or(user.avatar);
            user.is_email_verified = profile.verified_email;
            let updated = self
                .user_repo
                .update(&user)
                .await
                .context("Failed to link Google account")?;
            return Ok(updated);
        }

        // New account; the first one in the system becomes the administrator
        let role = if self.is_first_user().await? {
            UserRole::Admin
        } else {
            UserRole::User
        };

        let created = self
            .user_repo
            .create(&CreateUserInput {
                email: profile.email.clone(),
                name: profile.name.clone(),
                google_id: Some(profile.id.clone()),
                avatar: profile.picture.clone(),
                is_email_verified: profile.verified_email,
                role: Some(role),
            })
            .await
            .context("Failed to create user")?;

        Ok(created)
    }

    /// Create a new session for a user
    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        let created = self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok(created)
    }

    /// Check if no users exist yet (for auto-admin)
    async fn is_first_user(&self) -> Result<bool, UserServiceError> {
        let count = self
            .user_repo
            .count()
            .await
            .context("Failed to count users")?;

        Ok(count == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, UserService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let service = UserService::new(user_repo, session_repo);

        (pool, service)
    }

    fn google_profile(id: &str, email: &str) -> GoogleProfile {
        GoogleProfile {
            id: id.to_string(),
            email: email.to_string(),
            name: Some("Aspirant Kumar".to_string()),
            picture: Some("https://lh3.googleusercontent.com/a/photo".to_string()),
            verified_email: true,
        }
    }

    // ========================================================================
    // Sign-in tests
    // ========================================================================

    #[tokio::test]
    async fn test_first_sign_in_becomes_admin() {
        let (_pool, service) = setup_test_service().await;

        let (user, session) = service
            .login_with_google(&google_profile("sub-1", "first@example.com"))
            .await
            .expect("Failed to sign in");

        assert_eq!(user.role, UserRole::Admin);
        assert_eq!(user.email, "first@example.com");
        assert!(user.last_login_at.is_some());
        assert!(!session.id.is_empty());
        assert!(!session.is_expired());
    }

    #[tokio::test]
    async fn test_second_sign_in_is_regular_user() {
        let (_pool, service) = setup_test_service().await;

        service
            .login_with_google(&google_profile("sub-1", "first@example.com"))
            .await
            .expect("Failed to sign in first user");

        let (user, _session) = service
            .login_with_google(&google_profile("sub-2", "second@example.com"))
            .await
            .expect("Failed to sign in second user");

        assert_eq!(user.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_repeat_sign_in_reuses_account() {
        let (_pool, service) = setup_test_service().await;

        let (first, _) = service
            .login_with_google(&google_profile("sub-1", "aspirant@example.com"))
            .await
            .expect("Failed to sign in");

        let mut returning = google_profile("sub-1", "aspirant@example.com");
        returning.name = Some("Renamed Aspirant".to_string());
        let (second, _) = service
            .login_with_google(&returning)
            .await
            .expect("Failed to sign in again");

        assert_eq!(second.id, first.id);
        assert_eq!(second.name.as_deref(), Some("Renamed Aspirant"));
    }

    #[tokio::test]
    async fn test_sign_in_links_existing_email_account() {
        let (_pool, service) = setup_test_service().await;

        // Account that predates the Google link
        let existing = service
            .user_repo
            .create(&CreateUserInput {
                email: "linkme@example.com".to_string(),
                name: Some("Old Name".to_string()),
                google_id: None,
                avatar: None,
                is_email_verified: false,
                role: None,
            })
            .await
            .expect("Failed to create user");

        let (user, _session) = service
            .login_with_google(&google_profile("sub-9", "linkme@example.com"))
            .await
            .expect("Failed to sign in");

        assert_eq!(user.id, existing.id);
        assert_eq!(user.google_id.as_deref(), Some("sub-9"));
        assert!(user.is_email_verified);
        assert_eq!(user.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_sign_in_without_email_fails() {
        let (_pool, service) = setup_test_service().await;

        let mut profile = google_profile("sub-1", "");
        profile.email = "  ".to_string();

        let result = service.login_with_google(&profile).await;

        assert!(matches!(
            result,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    // ========================================================================
    // Session tests
    // ========================================================================

    #[tokio::test]
    async fn test_validate_session_returns_user() {
        let (_pool, service) = setup_test_service().await;

        let (user, session) = service
            .login_with_google(&google_profile("sub-1", "aspirant@example.com"))
            .await
            .expect("Failed to sign in");

        let validated = service
            .validate_session(&session.id)
            .await
            .expect("Failed to validate session")
            .expect("Session should be valid");

        assert_eq!(validated.id, user.id);
    }

    #[tokio::test]
    async fn test_validate_unknown_session_returns_none() {
        let (_pool, service) = setup_test_service().await;

        let validated = service
            .validate_session("no-such-token")
            .await
            .expect("Failed to validate session");

        assert!(validated.is_none());
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_deleted() {
        let (pool, _service) = setup_test_service().await;

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        // Sessions expire immediately
        let service = UserService::with_session_expiration(user_repo, session_repo, -1);

        let (_user, session) = service
            .login_with_google(&google_profile("sub-1", "aspirant@example.com"))
            .await
            .expect("Failed to sign in");

        let validated = service
            .validate_session(&session.id)
            .await
            .expect("Failed to validate session");
        assert!(validated.is_none());

        // The expired row was removed on validation
        let remaining = service
            .session_repo
            .get_by_id(&session.id)
            .await
            .expect("Failed to get session");
        assert!(remaining.is_none());
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let (_pool, service) = setup_test_service().await;

        let (_user, session) = service
            .login_with_google(&google_profile("sub-1", "aspirant@example.com"))
            .await
            .expect("Failed to sign in");

        service
            .logout(&session.id)
            .await
            .expect("Failed to logout");

        let validated = service
            .validate_session(&session.id)
            .await
            .expect("Failed to validate session");
        assert!(validated.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_expired_sessions() {
        let (pool, service) = setup_test_service().await;

        let user_repo = SqlxUserRepository::boxed(pool.clone());
        let session_repo = SqlxSessionRepository::boxed(pool.clone());
        let short_lived = UserService::with_session_expiration(user_repo, session_repo, -1);

        // One live session, one already expired
        service
            .login_with_google(&google_profile("sub-1", "live@example.com"))
            .await
            .expect("Failed to sign in");
        short_lived
            .login_with_google(&google_profile("sub-2", "stale@example.com"))
            .await
            .expect("Failed to sign in");

        let deleted = service
            .cleanup_expired_sessions()
            .await
            .expect("Failed to cleanup sessions");

        assert_eq!(deleted, 1);
    }
}
