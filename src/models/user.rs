//! User model
//!
//! Users are created through Google sign-in; there is no password login.
//! The `google_id` links the account to its Google identity, and `email`
//! allows linking a pre-existing account on first OAuth sign-in.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Email address (unique)
    pub email: String,
    /// Display name from the OAuth profile
    pub name: Option<String>,
    /// Google account ID (unique when present)
    #[serde(skip_serializing)]
    pub google_id: Option<String>,
    /// Avatar URL from the OAuth profile
    pub avatar: Option<String>,
    /// User role
    pub role: UserRole,
    /// Whether the provider reported the email as verified
    pub is_email_verified: bool,
    /// Preferred content language
    pub preferred_language: Language,
    /// Last sign-in timestamp
    pub last_login_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// User role for authorization.
///
/// Stored and serialized in uppercase to match the wire format clients
/// already rely on (`"USER"` / `"ADMIN"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    /// Regular account
    User,
    /// Administrator - full back-office access
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "USER"),
            UserRole::Admin => write!(f, "ADMIN"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(UserRole::User),
            "ADMIN" => Ok(UserRole::Admin),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Content language for question translations and UI copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    En,
    /// Hindi
    Hi,
}

impl Default for Language {
    fn default() -> Self {
        Self::En
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::En => write!(f, "en"),
            Language::Hi => write!(f, "hi"),
        }
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" => Ok(Language::En),
            "hi" => Ok(Language::Hi),
            _ => Err(anyhow::anyhow!("Invalid language: {}", s)),
        }
    }
}

/// Input for creating a user from an OAuth profile
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Email address
    pub email: String,
    /// Display name
    pub name: Option<String>,
    /// Google account ID
    pub google_id: Option<String>,
    /// Avatar URL
    pub avatar: Option<String>,
    /// Whether the provider verified the email
    pub is_email_verified: bool,
    /// Role (optional, defaults to User)
    pub role: Option<UserRole>,
}
