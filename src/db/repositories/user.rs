//! User repository
//!
//! Database operations for Google sign-in accounts.
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `SqlxUserRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateUserInput, Language, User, UserRole};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create(&self, input: &CreateUserInput) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Get user by Google account id
    async fn get_by_google_id(&self, google_id: &str) -> Result<Option<User>>;

    /// Update a user's mutable fields
    async fn update(&self, user: &User) -> Result<User>;

    /// Stamp the user's last login time
    async fn record_login(&self, id: i64) -> Result<()>;

    /// Count total users
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based user repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxUserRepository {
    pool: DynDatabasePool,
}

impl SqlxUserRepository {
    /// Create a new SQLx user repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, input: &CreateUserInput) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_user_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => create_user_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_user_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_email_sqlite(self.pool.as_sqlite().unwrap(), email).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_email_mysql(self.pool.as_mysql().unwrap(), email).await
            }
        }
    }

    async fn get_by_google_id(&self, google_id: &str) -> Result<Option<User>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_user_by_google_id_sqlite(self.pool.as_sqlite().unwrap(), google_id).await
            }
            DatabaseDriver::Mysql => {
                get_user_by_google_id_mysql(self.pool.as_mysql().unwrap(), google_id).await
            }
        }
    }

    async fn update(&self, user: &User) -> Result<User> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => update_user_sqlite(self.pool.as_sqlite().unwrap(), user).await,
            DatabaseDriver::Mysql => update_user_mysql(self.pool.as_mysql().unwrap(), user).await,
        }
    }

    async fn record_login(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => record_login_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => record_login_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_users_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_users_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

const USER_COLUMNS: &str = "id, email, name, google_id, avatar, role, is_email_verified, \
                            preferred_language, last_login_at, created_at, updated_at";

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_user_sqlite(pool: &SqlitePool, input: &CreateUserInput) -> Result<User> {
    let now = Utc::now();
    let role = input.role.unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, name, google_id, avatar, role, is_email_verified, preferred_language, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.email)
    .bind(&input.name)
    .bind(&input.google_id)
    .bind(&input.avatar)
    .bind(role.to_string())
    .bind(input.is_email_verified)
    .bind(Language::default().to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_rowid();

    Ok(User {
        id,
        email: input.email.clone(),
        name: input.name.clone(),
        google_id: input.google_id.clone(),
        avatar: input.avatar.clone(),
        role,
        is_email_verified: input.is_email_verified,
        preferred_language: Language::default(),
        last_login_at: None,
        created_at: now,
        updated_at: now,
    })
}

async fn get_user_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_sqlite(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_google_id_sqlite(pool: &SqlitePool, google_id: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE google_id = ?",
        USER_COLUMNS
    ))
    .bind(google_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by Google id")?;

    match row {
        Some(row) => Ok(Some(row_to_user_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn update_user_sqlite(pool: &SqlitePool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET email = ?, name = ?, google_id = ?, avatar = ?, role = ?,
            is_email_verified = ?, preferred_language = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.google_id)
    .bind(&user.avatar)
    .bind(user.role.to_string())
    .bind(user.is_email_verified)
    .bind(user.preferred_language.to_string())
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_by_id_sqlite(pool, user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn record_login_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to record login")?;

    Ok(())
}

async fn count_users_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(row.get("count"))
}

fn row_to_user_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    let language_str: String = row.get("preferred_language");
    let preferred_language = Language::from_str(&language_str).unwrap_or_default();

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        google_id: row.get("google_id"),
        avatar: row.get("avatar"),
        role,
        is_email_verified: row.try_get("is_email_verified").unwrap_or(false),
        preferred_language,
        last_login_at: row.get("last_login_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_user_mysql(pool: &MySqlPool, input: &CreateUserInput) -> Result<User> {
    let now = Utc::now();
    let role = input.role.unwrap_or_default();

    let result = sqlx::query(
        r#"
        INSERT INTO users (email, name, google_id, avatar, role, is_email_verified, preferred_language, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.email)
    .bind(&input.name)
    .bind(&input.google_id)
    .bind(&input.avatar)
    .bind(role.to_string())
    .bind(input.is_email_verified)
    .bind(Language::default().to_string())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    let id = result.last_insert_id() as i64;

    Ok(User {
        id,
        email: input.email.clone(),
        name: input.name.clone(),
        google_id: input.google_id.clone(),
        avatar: input.avatar.clone(),
        role,
        is_email_verified: input.is_email_verified,
        preferred_language: Language::default(),
        last_login_at: None,
        created_at: now,
        updated_at: now,
    })
}

async fn get_user_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_email_mysql(pool: &MySqlPool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to get user by email")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_user_by_google_id_mysql(pool: &MySqlPool, google_id: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE google_id = ?",
        USER_COLUMNS
    ))
    .bind(google_id)
    .fetch_optional(pool)
    .await
    .context("Failed to get user by Google id")?;

    match row {
        Some(row) => Ok(Some(row_to_user_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn update_user_mysql(pool: &MySqlPool, user: &User) -> Result<User> {
    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE users
        SET email = ?, name = ?, google_id = ?, avatar = ?, role = ?,
            is_email_verified = ?, preferred_language = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.google_id)
    .bind(&user.avatar)
    .bind(user.role.to_string())
    .bind(user.is_email_verified)
    .bind(user.preferred_language.to_string())
    .bind(now)
    .bind(user.id)
    .execute(pool)
    .await
    .context("Failed to update user")?;

    get_user_by_id_mysql(pool, user.id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("User not found after update"))
}

async fn record_login_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("UPDATE users SET last_login_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to record login")?;

    Ok(())
}

async fn count_users_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM users")
        .fetch_one(pool)
        .await
        .context("Failed to count users")?;

    Ok(row.get("count"))
}

fn row_to_user_mysql(row: &sqlx::mysql::MySqlRow) -> Result<User> {
    let role_str: String = row.get("role");
    let role = UserRole::from_str(&role_str)
        .with_context(|| format!("Invalid role in database: {}", role_str))?;

    let language_str: String = row.get("preferred_language");
    let preferred_language = Language::from_str(&language_str).unwrap_or_default();

    Ok(User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        google_id: row.get("google_id"),
        avatar: row.get("avatar"),
        role,
        is_email_verified: row.try_get("is_email_verified").unwrap_or(false),
        preferred_language,
        last_login_at: row.get("last_login_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxUserRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxUserRepository::new(pool.clone());
        (pool, repo)
    }

    fn google_input(email: &str, google_id: &str) -> CreateUserInput {
        CreateUserInput {
            email: email.to_string(),
            name: Some("Test Aspirant".to_string()),
            google_id: Some(google_id.to_string()),
            avatar: Some("https://lh3.googleusercontent.com/a/photo".to_string()),
            is_email_verified: true,
            role: None,
        }
    }

    #[tokio::test]
    async fn test_create_user() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&google_input("aspirant@example.com", "google-sub-1"))
            .await
            .expect("Failed to create user");

        assert!(created.id > 0);
        assert_eq!(created.email, "aspirant@example.com");
        assert_eq!(created.role, UserRole::User);
        assert_eq!(created.preferred_language, Language::En);
        assert!(created.is_email_verified);
        assert!(created.last_login_at.is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_id() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&google_input("aspirant@example.com", "google-sub-1"))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.id, created.id);
        assert_eq!(found.google_id.as_deref(), Some("google-sub-1"));
    }

    #[tokio::test]
    async fn test_get_user_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_id(999).await.expect("Failed to get user");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_email() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&google_input("unique@example.com", "google-sub-2"))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_email("unique@example.com")
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.email, "unique@example.com");
    }

    #[tokio::test]
    async fn test_get_user_by_google_id() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&google_input("aspirant@example.com", "google-sub-3"))
            .await
            .expect("Failed to create user");

        let found = repo
            .get_by_google_id("google-sub-3")
            .await
            .expect("Failed to get user")
            .expect("User not found");

        assert_eq!(found.email, "aspirant@example.com");

        let missing = repo
            .get_by_google_id("no-such-sub")
            .await
            .expect("Failed to get user");
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_update_links_google_account() {
        let (_pool, repo) = setup_test_repo().await;

        // Account created without a Google id (e.g. pre-linked by email)
        let mut user = repo
            .create(&CreateUserInput {
                email: "linkme@example.com".to_string(),
                name: None,
                google_id: None,
                avatar: None,
                is_email_verified: false,
                role: None,
            })
            .await
            .expect("Failed to create user");

        user.google_id = Some("google-sub-9".to_string());
        user.name = Some("Linked Name".to_string());
        user.is_email_verified = true;

        let updated = repo.update(&user).await.expect("Failed to update user");

        assert_eq!(updated.google_id.as_deref(), Some("google-sub-9"));
        assert_eq!(updated.name.as_deref(), Some("Linked Name"));
        assert!(updated.is_email_verified);
    }

    #[tokio::test]
    async fn test_record_login() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&google_input("aspirant@example.com", "google-sub-1"))
            .await
            .expect("Failed to create user");

        repo.record_login(created.id)
            .await
            .expect("Failed to record login");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get user")
            .expect("User not found");
        assert!(found.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_count_users() {
        let (_pool, repo) = setup_test_repo().await;

        let count = repo.count().await.expect("Failed to count users");
        assert_eq!(count, 0);

        repo.create(&google_input("one@example.com", "sub-1"))
            .await
            .expect("Failed to create user");
        repo.create(&google_input("two@example.com", "sub-2"))
            .await
            .expect("Failed to create user");

        let count = repo.count().await.expect("Failed to count users");
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_unique_email_constraint() {
        let (_pool, repo) = setup_test_repo().await;

        repo.create(&google_input("duplicate@example.com", "sub-1"))
            .await
            .expect("Failed to create first user");
        let result = repo.create(&google_input("duplicate@example.com", "sub-2")).await;

        assert!(result.is_err(), "Should fail due to duplicate email");
    }

    #[tokio::test]
    async fn test_create_user_with_admin_role() {
        let (_pool, repo) = setup_test_repo().await;

        let mut input = google_input("admin@example.com", "sub-admin");
        input.role = Some(UserRole::Admin);

        let created = repo.create(&input).await.expect("Failed to create admin");

        assert_eq!(created.role, UserRole::Admin);
        assert!(created.is_admin());
    }
}
