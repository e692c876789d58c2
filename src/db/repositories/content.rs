//! Content catalog repository
//!
//! Exams, test series, and notes share the same image-card shape, so one
//! repository covers all three rails. Listings are ordered by id ascending;
//! the homepage takes the first ten of each. The catalog tables arrive
//! pre-seeded by the migrations.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    CreateExamInput, CreateNoteInput, CreateTestSeriesInput, Exam, Note, TestSeries,
    UpdateCardInput,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

/// Content catalog repository trait
#[async_trait]
pub trait ContentRepository: Send + Sync {
    /// List exams ordered by id, optionally capped
    async fn list_exams(&self, limit: Option<i64>) -> Result<Vec<Exam>>;

    /// Create an exam card
    async fn create_exam(&self, input: &CreateExamInput) -> Result<Exam>;

    /// Update an exam card's title and/or image
    async fn update_exam(&self, id: i64, input: &UpdateCardInput) -> Result<Option<Exam>>;

    /// Delete an exam card
    async fn delete_exam(&self, id: i64) -> Result<bool>;

    /// List test series ordered by id, optionally capped
    async fn list_test_series(&self, limit: Option<i64>) -> Result<Vec<TestSeries>>;

    /// Create a test series card
    async fn create_test_series(&self, input: &CreateTestSeriesInput) -> Result<TestSeries>;

    /// Update a test series card's title and/or image
    async fn update_test_series(
        &self,
        id: i64,
        input: &UpdateCardInput,
    ) -> Result<Option<TestSeries>>;

    /// Delete a test series card
    async fn delete_test_series(&self, id: i64) -> Result<bool>;

    /// List notes ordered by id, optionally capped
    async fn list_notes(&self, limit: Option<i64>) -> Result<Vec<Note>>;

    /// Create a notes card
    async fn create_note(&self, input: &CreateNoteInput) -> Result<Note>;

    /// Update a notes card's title and/or image
    async fn update_note(&self, id: i64, input: &UpdateCardInput) -> Result<Option<Note>>;

    /// Delete a notes card
    async fn delete_note(&self, id: i64) -> Result<bool>;
}

/// SQLx-based content repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxContentRepository {
    pool: DynDatabasePool,
}

impl SqlxContentRepository {
    /// Create a new SQLx content repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContentRepository> {
        Arc::new(Self::new(pool))
    }

    async fn delete_row(&self, table: &str, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", table);
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(&sql)
                .bind(id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .with_context(|| format!("Failed to delete from {}", table))?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(&sql)
                .bind(id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .with_context(|| format!("Failed to delete from {}", table))?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

fn limit_clause(limit: Option<i64>) -> String {
    match limit {
        Some(limit) => format!(" LIMIT {}", limit.max(0)),
        None => String::new(),
    }
}

#[async_trait]
impl ContentRepository for SqlxContentRepository {
    async fn list_exams(&self, limit: Option<i64>) -> Result<Vec<Exam>> {
        let sql = format!(
            "SELECT id, title, image_url, created_at FROM exams ORDER BY id ASC{}",
            limit_clause(limit)
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to list exams")?;
                Ok(rows.iter().map(row_to_exam_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to list exams")?;
                Ok(rows.iter().map(row_to_exam_mysql).collect())
            }
        }
    }

    async fn create_exam(&self, input: &CreateExamInput) -> Result<Exam> {
        let now = Utc::now();
        let sql = "INSERT INTO exams (title, image_url, created_at, updated_at) VALUES (?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&input.title)
                .bind(&input.image_url)
                .bind(now)
                .bind(now)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to create exam")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&input.title)
                .bind(&input.image_url)
                .bind(now)
                .bind(now)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to create exam")?
                .last_insert_id() as i64,
        };

        Ok(Exam {
            id,
            title: input.title.clone(),
            image_url: input.image_url.clone(),
            created_at: now,
        })
    }

    async fn update_exam(&self, id: i64, input: &UpdateCardInput) -> Result<Option<Exam>> {
        let Some(mut exam) = self.fetch_exam(id).await? else {
            return Ok(None);
        };
        if let Some(title) = &input.title {
            exam.title = title.clone();
        }
        if let Some(image_url) = &input.image_url {
            exam.image_url = image_url.clone();
        }

        let sql = "UPDATE exams SET title = ?, image_url = ?, updated_at = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&exam.title)
                    .bind(&exam.image_url)
                    .bind(Utc::now())
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to update exam")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&exam.title)
                    .bind(&exam.image_url)
                    .bind(Utc::now())
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to update exam")?;
            }
        }

        Ok(Some(exam))
    }

    async fn delete_exam(&self, id: i64) -> Result<bool> {
        self.delete_row("exams", id).await
    }

    async fn list_test_series(&self, limit: Option<i64>) -> Result<Vec<TestSeries>> {
        let sql = format!(
            "SELECT id, title, image_url, exam_id, created_at FROM test_series ORDER BY id ASC{}",
            limit_clause(limit)
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to list test series")?;
                Ok(rows.iter().map(row_to_test_series_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to list test series")?;
                Ok(rows.iter().map(row_to_test_series_mysql).collect())
            }
        }
    }

    async fn create_test_series(&self, input: &CreateTestSeriesInput) -> Result<TestSeries> {
        let now = Utc::now();
        let sql = "INSERT INTO test_series (title, image_url, exam_id, created_at, updated_at) \
                   VALUES (?, ?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&input.title)
                .bind(&input.image_url)
                .bind(input.exam_id)
                .bind(now)
                .bind(now)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to create test series")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&input.title)
                .bind(&input.image_url)
                .bind(input.exam_id)
                .bind(now)
                .bind(now)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to create test series")?
                .last_insert_id() as i64,
        };

        Ok(TestSeries {
            id,
            title: input.title.clone(),
            image_url: input.image_url.clone(),
            exam_id: input.exam_id,
            created_at: now,
        })
    }

    async fn update_test_series(
        &self,
        id: i64,
        input: &UpdateCardInput,
    ) -> Result<Option<TestSeries>> {
        let Some(mut series) = self.fetch_test_series(id).await? else {
            return Ok(None);
        };
        if let Some(title) = &input.title {
            series.title = title.clone();
        }
        if let Some(image_url) = &input.image_url {
            series.image_url = image_url.clone();
        }

        let sql = "UPDATE test_series SET title = ?, image_url = ?, updated_at = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&series.title)
                    .bind(&series.image_url)
                    .bind(Utc::now())
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to update test series")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&series.title)
                    .bind(&series.image_url)
                    .bind(Utc::now())
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to update test series")?;
            }
        }

        Ok(Some(series))
    }

    async fn delete_test_series(&self, id: i64) -> Result<bool> {
        self.delete_row("test_series", id).await
    }

    async fn list_notes(&self, limit: Option<i64>) -> Result<Vec<Note>> {
        let sql = format!(
            "SELECT id, title, image_url, user_id, created_at FROM notes ORDER BY id ASC{}",
            limit_clause(limit)
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to list notes")?;
                Ok(rows.iter().map(row_to_note_sqlite).collect())
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to list notes")?;
                Ok(rows.iter().map(row_to_note_mysql).collect())
            }
        }
    }

    async fn create_note(&self, input: &CreateNoteInput) -> Result<Note> {
        let now = Utc::now();
        let sql = "INSERT INTO notes (title, image_url, user_id, created_at, updated_at) \
                   VALUES (?, ?, ?, ?, ?)";
        let id = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(&input.title)
                .bind(&input.image_url)
                .bind(input.user_id)
                .bind(now)
                .bind(now)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to create note")?
                .last_insert_rowid(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(&input.title)
                .bind(&input.image_url)
                .bind(input.user_id)
                .bind(now)
                .bind(now)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to create note")?
                .last_insert_id() as i64,
        };

        Ok(Note {
            id,
            title: input.title.clone(),
            image_url: input.image_url.clone(),
            user_id: input.user_id,
            created_at: now,
        })
    }

    async fn update_note(&self, id: i64, input: &UpdateCardInput) -> Result<Option<Note>> {
        let Some(mut note) = self.fetch_note(id).await? else {
            return Ok(None);
        };
        if let Some(title) = &input.title {
            note.title = title.clone();
        }
        if let Some(image_url) = &input.image_url {
            note.image_url = image_url.clone();
        }

        let sql = "UPDATE notes SET title = ?, image_url = ?, updated_at = ? WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                sqlx::query(sql)
                    .bind(&note.title)
                    .bind(&note.image_url)
                    .bind(Utc::now())
                    .bind(id)
                    .execute(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to update note")?;
            }
            DatabaseDriver::Mysql => {
                sqlx::query(sql)
                    .bind(&note.title)
                    .bind(&note.image_url)
                    .bind(Utc::now())
                    .bind(id)
                    .execute(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to update note")?;
            }
        }

        Ok(Some(note))
    }

    async fn delete_note(&self, id: i64) -> Result<bool> {
        self.delete_row("notes", id).await
    }
}

impl SqlxContentRepository {
    async fn fetch_exam(&self, id: i64) -> Result<Option<Exam>> {
        let sql = "SELECT id, title, image_url, created_at FROM exams WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to get exam")?;
                Ok(row.as_ref().map(row_to_exam_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to get exam")?;
                Ok(row.as_ref().map(row_to_exam_mysql))
            }
        }
    }

    async fn fetch_test_series(&self, id: i64) -> Result<Option<TestSeries>> {
        let sql = "SELECT id, title, image_url, exam_id, created_at FROM test_series WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to get test series")?;
                Ok(row.as_ref().map(row_to_test_series_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to get test series")?;
                Ok(row.as_ref().map(row_to_test_series_mysql))
            }
        }
    }

    async fn fetch_note(&self, id: i64) -> Result<Option<Note>> {
        let sql = "SELECT id, title, image_url, user_id, created_at FROM notes WHERE id = ?";
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to get note")?;
                Ok(row.as_ref().map(row_to_note_sqlite))
            }
            DatabaseDriver::Mysql => {
                let row = sqlx::query(sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to get note")?;
                Ok(row.as_ref().map(row_to_note_mysql))
            }
        }
    }
}

fn row_to_exam_sqlite(row: &sqlx::sqlite::SqliteRow) -> Exam {
    Exam {
        id: row.get("id"),
        title: row.get("title"),
        image_url: row.try_get("image_url").unwrap_or_default(),
        created_at: row.get("created_at"),
    }
}

fn row_to_exam_mysql(row: &sqlx::mysql::MySqlRow) -> Exam {
    Exam {
        id: row.get("id"),
        title: row.get("title"),
        image_url: row.try_get("image_url").unwrap_or_default(),
        created_at: row.get("created_at"),
    }
}

fn row_to_test_series_sqlite(row: &sqlx::sqlite::SqliteRow) -> TestSeries {
    TestSeries {
        id: row.get("id"),
        title: row.get("title"),
        image_url: row.try_get("image_url").unwrap_or_default(),
        exam_id: row.get("exam_id"),
        created_at: row.get("created_at"),
    }
}

fn row_to_test_series_mysql(row: &sqlx::mysql::MySqlRow) -> TestSeries {
    TestSeries {
        id: row.get("id"),
        title: row.get("title"),
        image_url: row.try_get("image_url").unwrap_or_default(),
        exam_id: row.get("exam_id"),
        created_at: row.get("created_at"),
    }
}

fn row_to_note_sqlite(row: &sqlx::sqlite::SqliteRow) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        image_url: row.try_get("image_url").unwrap_or_default(),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
    }
}

fn row_to_note_mysql(row: &sqlx::mysql::MySqlRow) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        image_url: row.try_get("image_url").unwrap_or_default(),
        user_id: row.get("user_id"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxContentRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxContentRepository::new(pool.clone());
        (pool, repo)
    }

    #[tokio::test]
    async fn test_list_exams_seeded_in_id_order() {
        let (_pool, repo) = setup_test_repo().await;

        let exams = repo.list_exams(None).await.expect("Failed to list exams");
        assert_eq!(exams.len(), 3);
        assert_eq!(exams[0].title, "UPSC Civil Services Exam");
        assert!(exams.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn test_list_exams_with_limit() {
        let (_pool, repo) = setup_test_repo().await;

        let exams = repo.list_exams(Some(2)).await.expect("Failed to list exams");
        assert_eq!(exams.len(), 2);
    }

    #[tokio::test]
    async fn test_create_exam() {
        let (_pool, repo) = setup_test_repo().await;

        let exam = repo
            .create_exam(&CreateExamInput {
                title: "RBI Grade B".to_string(),
                image_url: "/uploads/rbi.png".to_string(),
            })
            .await
            .expect("Failed to create exam");

        assert!(exam.id > 3);
        let exams = repo.list_exams(None).await.unwrap();
        assert_eq!(exams.len(), 4);
        assert_eq!(exams.last().unwrap().title, "RBI Grade B");
    }

    #[tokio::test]
    async fn test_update_exam_partial() {
        let (_pool, repo) = setup_test_repo().await;

        let updated = repo
            .update_exam(
                1,
                &UpdateCardInput {
                    title: Some("UPSC CSE".to_string()),
                    image_url: None,
                },
            )
            .await
            .expect("Failed to update exam")
            .expect("Exam not found");

        assert_eq!(updated.title, "UPSC CSE");
        assert_eq!(updated.image_url, "https://picsum.photos/400/300?random=1");
    }

    #[tokio::test]
    async fn test_update_missing_exam() {
        let (_pool, repo) = setup_test_repo().await;
        let updated = repo
            .update_exam(999, &UpdateCardInput::default())
            .await
            .expect("Failed to update exam");
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_delete_exam() {
        let (_pool, repo) = setup_test_repo().await;

        assert!(repo.delete_exam(2).await.unwrap());
        assert!(!repo.delete_exam(2).await.unwrap());
        assert_eq!(repo.list_exams(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_test_series_keeps_exam_link() {
        let (_pool, repo) = setup_test_repo().await;

        let series = repo.list_test_series(None).await.unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[1].title, "SSC CGL Mock Tests");
        assert_eq!(series[1].exam_id, Some(2));

        let created = repo
            .create_test_series(&CreateTestSeriesInput {
                title: "UPSC Mains Series".to_string(),
                image_url: "/uploads/mains.png".to_string(),
                exam_id: Some(1),
            })
            .await
            .expect("Failed to create test series");
        assert_eq!(created.exam_id, Some(1));
    }

    #[tokio::test]
    async fn test_delete_exam_unlinks_test_series() {
        let (_pool, repo) = setup_test_repo().await;

        assert!(repo.delete_exam(2).await.unwrap());

        // FK is ON DELETE SET NULL
        let series = repo.list_test_series(None).await.unwrap();
        let unlinked = series.iter().find(|s| s.title == "SSC CGL Mock Tests").unwrap();
        assert_eq!(unlinked.exam_id, None);
    }

    #[tokio::test]
    async fn test_notes_crud() {
        let (_pool, repo) = setup_test_repo().await;

        let notes = repo.list_notes(Some(10)).await.unwrap();
        assert_eq!(notes.len(), 3);
        assert!(notes[0].user_id.is_none());

        let created = repo
            .create_note(&CreateNoteInput {
                title: "Modern History Crash Notes".to_string(),
                image_url: "/uploads/history.png".to_string(),
                user_id: None,
            })
            .await
            .expect("Failed to create note");

        let updated = repo
            .update_note(
                created.id,
                &UpdateCardInput {
                    title: None,
                    image_url: Some("/uploads/history-v2.png".to_string()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Modern History Crash Notes");
        assert_eq!(updated.image_url, "/uploads/history-v2.png");

        assert!(repo.delete_note(created.id).await.unwrap());
        assert_eq!(repo.list_notes(None).await.unwrap().len(), 3);
    }
}
