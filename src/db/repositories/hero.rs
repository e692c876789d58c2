//! Hero section repository
//!
//! Carousel banners for the homepage. The `text` column is backtick-quoted
//! because it doubles as a type name on MySQL; SQLite accepts the same
//! quoting, so both drivers share the SQL.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::HeroSection;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Hero section repository trait
#[async_trait]
pub trait HeroRepository: Send + Sync {
    /// All banners in carousel order (id ascending)
    async fn list(&self) -> Result<Vec<HeroSection>>;

    /// Get one banner by id
    async fn get(&self, id: i64) -> Result<Option<HeroSection>>;

    /// Create a banner
    async fn create(&self, text: &str, image_url: &str) -> Result<HeroSection>;

    /// Update a banner's text and optionally its image
    async fn update(
        &self,
        id: i64,
        text: &str,
        image_url: Option<&str>,
    ) -> Result<Option<HeroSection>>;

    /// Delete a banner
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// SQLx-based hero section repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxHeroRepository {
    pool: DynDatabasePool,
}

impl SqlxHeroRepository {
    /// Create a new SQLx hero repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn HeroRepository> {
        Arc::new(Self::new(pool))
    }
}

const HERO_COLUMNS: &str = "id, `text`, image_url, created_at, updated_at";

#[async_trait]
impl HeroRepository for SqlxHeroRepository {
    async fn list(&self) -> Result<Vec<HeroSection>> {
        let sql = format!("SELECT {} FROM hero_sections ORDER BY id ASC", HERO_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to list hero sections")?;
                Ok(rows.iter().map(row_to_hero_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to list hero sections")?;
                Ok(rows.iter().map(row_to_hero_mysql).collect())
            }
        }
    }

    async fn get(&self, id: i64) -> Result<Option<HeroSection>> {
        let sql = format!("SELECT {} FROM hero_sections WHERE id = ?", HERO_COLUMNS);
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to get hero section")?;
                Ok(row.as_ref().map(row_to_hero_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to get hero section")?;
                Ok(row.as_ref().map(row_to_hero_mysql))
            }
        }
    }

    async fn create(&self, text: &str, image_url: &str) -> Result<HeroSection> {
        let now = Utc::now();
        let sql = "INSERT INTO hero_sections (`text`, image_url, created_at, updated_at) \
                   VALUES (?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(text)
                .bind(image_url)
                .bind(now)
                .bind(now)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to create hero section")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(text)
                .bind(image_url)
                .bind(now)
                .bind(now)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to create hero section")?
                .last_insert_id() as i64,
        };

        Ok(HeroSection {
            id,
            text: text.to_string(),
            image_url: image_url.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(
        &self,
        id: i64,
        text: &str,
        image_url: Option<&str>,
    ) -> Result<Option<HeroSection>> {
        let Some(mut hero) = self.get(id).await? else {
            return Ok(None);
        };
        hero.text = text.to_string();
        if let Some(image_url) = image_url {
            hero.image_url = image_url.to_string();
        }
        hero.updated_at = Utc::now();

        let sql = "UPDATE hero_sections SET `text` = ?, image_url = ?, updated_at = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&hero.text)
                    .bind(&hero.image_url)
                    .bind(hero.updated_at)
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to update hero section")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&hero.text)
                    .bind(&hero.image_url)
                    .bind(hero.updated_at)
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to update hero section")?;
            }
        }

        Ok(Some(hero))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM hero_sections WHERE id = ?";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to delete hero section")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to delete hero section")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

fn row_to_hero_sqlite(row: &sqlx::sqlite::SqliteRow) -> HeroSection {
    HeroSection {
        id: row.get("id"),
        text: row.get("text"),
        image_url: row.get("image_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn row_to_hero_mysql(row: &sqlx::mysql::MySqlRow) -> HeroSection {
    HeroSection {
        id: row.get("id"),
        text: row.get("text"),
        image_url: row.get("image_url"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
