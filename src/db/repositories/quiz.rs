//! Quiz repository
//!
//! Database operations for quizzes and their question lists. Creating a
//! quiz inserts the quiz row and its ordered quiz_questions rows in one
//! transaction. The public listing joins creator identity and aggregate
//! counts; the detail shape resolves each question's translation for the
//! requested language with an English fallback.

use crate::config::DatabaseDriver;
use crate::db::repositories::question::{
    load_tags_mysql, load_tags_sqlite, row_to_question_mysql, row_to_question_sqlite,
    QUESTION_COLUMNS, TRANSLATION_PICK,
};
use crate::db::DynDatabasePool;
use crate::models::{
    CreateQuizInput, Language, ListParams, PagedResult, Quiz, QuizDetail, QuizFilter,
    QuizQuestionDetail, QuizSummary, QuestionWithTranslation, UpdateQuizInput,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Quiz repository trait
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Create a quiz with its ordered question list atomically
    async fn create(&self, input: &CreateQuizInput, created_by: Option<i64>) -> Result<Quiz>;

    /// Get a bare quiz row by id
    async fn get(&self, id: i64) -> Result<Option<Quiz>>;

    /// Get a quiz with its ordered questions translated for `language`
    async fn get_detail(&self, id: i64, language: Language) -> Result<Option<QuizDetail>>;

    /// List active public quizzes matching the filter, newest first
    async fn list(
        &self,
        filter: &QuizFilter,
        params: &ListParams,
    ) -> Result<PagedResult<QuizSummary>>;

    /// Apply a partial metadata update, returning the updated quiz
    async fn update(&self, id: i64, input: &UpdateQuizInput) -> Result<Option<Quiz>>;

    /// Delete a quiz (question list and attempts cascade)
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Sum of points over the quiz's questions
    async fn total_points(&self, quiz_id: i64) -> Result<i64>;
}

/// SQLx-based quiz repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxQuizRepository {
    pool: DynDatabasePool,
}

impl SqlxQuizRepository {
    /// Create a new SQLx quiz repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn QuizRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl QuizRepository for SqlxQuizRepository {
    async fn create(&self, input: &CreateQuizInput, created_by: Option<i64>) -> Result<Quiz> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_quiz_sqlite(self.pool.as_sqlite().unwrap(), input, created_by).await
            }
            DatabaseDriver::Mysql => {
                create_quiz_mysql(self.pool.as_mysql().unwrap(), input, created_by).await
            }
        }
    }

    async fn get(&self, id: i64) -> Result<Option<Quiz>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => get_quiz_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => get_quiz_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_detail(&self, id: i64, language: Language) -> Result<Option<QuizDetail>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_detail_sqlite(self.pool.as_sqlite().unwrap(), id, language).await
            }
            DatabaseDriver::Mysql => {
                get_detail_mysql(self.pool.as_mysql().unwrap(), id, language).await
            }
        }
    }

    async fn list(
        &self,
        filter: &QuizFilter,
        params: &ListParams,
    ) -> Result<PagedResult<QuizSummary>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_quizzes_sqlite(self.pool.as_sqlite().unwrap(), filter, params).await
            }
            DatabaseDriver::Mysql => {
                list_quizzes_mysql(self.pool.as_mysql().unwrap(), filter, params).await
            }
        }
    }

    async fn update(&self, id: i64, input: &UpdateQuizInput) -> Result<Option<Quiz>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_quiz_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_quiz_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query("DELETE FROM quizzes WHERE id = ?")
                .bind(id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to delete quiz")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query("DELETE FROM quizzes WHERE id = ?")
                .bind(id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to delete quiz")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn total_points(&self, quiz_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let row = sqlx::query(
                    "SELECT COALESCE(SUM(points), 0) AS total FROM quiz_questions WHERE quiz_id = ?",
                )
                .bind(quiz_id)
                .fetch_one(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to sum quiz points")?;
                Ok(row.get("total"))
            }
            DatabaseDriver::Mysql => {
                // SUM() yields DECIMAL on MySQL, so cast back to an integer
                let row = sqlx::query(
                    "SELECT CAST(COALESCE(SUM(points), 0) AS SIGNED) AS total \
                     FROM quiz_questions WHERE quiz_id = ?",
                )
                .bind(quiz_id)
                .fetch_one(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to sum quiz points")?;
                Ok(row.get("total"))
            }
        }
    }
}

/// Columns selected for a bare quiz row
const QUIZ_COLUMNS: &str = "id, title, description, quiz_type, category, time_limit, \
     is_active, is_public, created_by, created_at, updated_at";

/// Build the WHERE clause and bind values for the public quiz listing
fn build_filter_sql(filter: &QuizFilter) -> (String, Vec<String>) {
    let mut clauses = vec!["q.is_active = 1".to_string(), "q.is_public = 1".to_string()];
    let mut binds = Vec::new();

    if let Some(quiz_type) = &filter.quiz_type {
        clauses.push("q.quiz_type = ?".to_string());
        binds.push(quiz_type.clone());
    }
    if let Some(category) = &filter.category {
        clauses.push("q.category = ?".to_string());
        binds.push(category.clone());
    }

    (clauses.join(" AND "), binds)
}

fn apply_update(quiz: &mut Quiz, input: &UpdateQuizInput) {
    if let Some(title) = &input.title {
        quiz.title = title.clone();
    }
    if let Some(description) = &input.description {
        quiz.description = Some(description.clone());
    }
    if let Some(quiz_type) = &input.quiz_type {
        quiz.quiz_type = Some(quiz_type.clone());
    }
    if let Some(category) = &input.category {
        quiz.category = Some(category.clone());
    }
    if let Some(time_limit) = input.time_limit {
        quiz.time_limit = Some(time_limit);
    }
    if let Some(is_active) = input.is_active {
        quiz.is_active = is_active;
    }
    if let Some(is_public) = input.is_public {
        quiz.is_public = is_public;
    }
    quiz.updated_at = Utc::now();
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_quiz_sqlite(
    pool: &SqlitePool,
    input: &CreateQuizInput,
    created_by: Option<i64>,
) -> Result<Quiz> {
    let now = Utc::now();

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO quizzes (title, description, quiz_type, category, time_limit, is_active, is_public, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.quiz_type)
    .bind(&input.category)
    .bind(input.time_limit)
    .bind(input.is_active)
    .bind(input.is_public)
    .bind(created_by)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create quiz")?;

    let quiz_id = result.last_insert_rowid();

    for (index, question) in input.questions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO quiz_questions (quiz_id, question_id, position, points) VALUES (?, ?, ?, ?)",
        )
        .bind(quiz_id)
        .bind(question.question_id)
        .bind((index + 1) as i64)
        .bind(question.points)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to add question {} to quiz", question.question_id))?;
    }

    tx.commit().await.context("Failed to commit quiz")?;

    Ok(assemble_quiz(quiz_id, input, created_by, now))
}

async fn get_quiz_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Quiz>> {
    let sql = format!("SELECT {} FROM quizzes WHERE id = ?", QUIZ_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get quiz")?;
    Ok(row.map(|row| row_to_quiz_sqlite(&row)))
}

async fn get_detail_sqlite(
    pool: &SqlitePool,
    id: i64,
    language: Language,
) -> Result<Option<QuizDetail>> {
    let Some(quiz) = get_quiz_sqlite(pool, id).await? else {
        return Ok(None);
    };

    let sql = format!(
        "SELECT qq.position, qq.points, {} FROM quiz_questions qq \
         INNER JOIN questions q ON q.id = qq.question_id \
         INNER JOIN question_translations t ON t.question_id = q.id \
         WHERE qq.quiz_id = ? AND t.id = ({}) \
         ORDER BY qq.position ASC",
        QUESTION_COLUMNS, TRANSLATION_PICK
    );

    let rows = sqlx::query(&sql)
        .bind(id)
        .bind(language.to_string())
        .fetch_all(pool)
        .await
        .context("Failed to load quiz questions")?;

    let mut slots = Vec::new();
    for row in &rows {
        let (question, translation) = row_to_question_sqlite(row)?;
        let order: i64 = row.get("position");
        let points: i64 = row.get("points");
        slots.push((order, points, question, translation));
    }

    let ids: Vec<i64> = slots.iter().map(|(_, _, q, _)| q.id).collect();
    let mut tags_map = load_tags_sqlite(pool, &ids).await?;

    let questions = slots
        .into_iter()
        .map(|(order, points, question, translation)| {
            let tags = tags_map.remove(&question.id).unwrap_or_default();
            QuizQuestionDetail {
                order,
                points,
                question: QuestionWithTranslation {
                    question,
                    translation,
                    tags,
                },
            }
        })
        .collect();

    Ok(Some(QuizDetail { quiz, questions }))
}

async fn list_quizzes_sqlite(
    pool: &SqlitePool,
    filter: &QuizFilter,
    params: &ListParams,
) -> Result<PagedResult<QuizSummary>> {
    let (where_sql, binds) = build_filter_sql(filter);

    let sql = format!(
        "SELECT q.id, q.title, q.description, q.quiz_type, q.category, q.time_limit, \
                q.is_active, q.is_public, q.created_by, q.created_at, q.updated_at, \
                u.name AS creator_name, u.email AS creator_email, \
                (SELECT COUNT(*) FROM quiz_questions qq WHERE qq.quiz_id = q.id) AS question_count, \
                (SELECT COUNT(*) FROM quiz_attempts qa WHERE qa.quiz_id = q.id) AS attempt_count \
         FROM quizzes q \
         LEFT JOIN users u ON u.id = q.created_by \
         WHERE {} \
         ORDER BY q.created_at DESC, q.id DESC \
         LIMIT ? OFFSET ?",
        where_sql
    );

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    query = query.bind(params.limit()).bind(params.offset());

    let rows = query.fetch_all(pool).await.context("Failed to list quizzes")?;

    let items = rows
        .iter()
        .map(|row| QuizSummary {
            quiz: row_to_quiz_sqlite(row),
            question_count: row.get("question_count"),
            attempt_count: row.get("attempt_count"),
            creator_name: row.get("creator_name"),
            creator_email: row.get("creator_email"),
        })
        .collect();

    let count_sql = format!("SELECT COUNT(*) as count FROM quizzes q WHERE {}", where_sql);
    let mut count_query = sqlx::query(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count quizzes")?
        .get("count");

    Ok(PagedResult::new(items, total, params))
}

async fn update_quiz_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateQuizInput,
) -> Result<Option<Quiz>> {
    let Some(mut quiz) = get_quiz_sqlite(pool, id).await? else {
        return Ok(None);
    };
    apply_update(&mut quiz, input);

    sqlx::query(
        r#"
        UPDATE quizzes
        SET title = ?, description = ?, quiz_type = ?, category = ?, time_limit = ?,
            is_active = ?, is_public = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&quiz.title)
    .bind(&quiz.description)
    .bind(&quiz.quiz_type)
    .bind(&quiz.category)
    .bind(quiz.time_limit)
    .bind(quiz.is_active)
    .bind(quiz.is_public)
    .bind(quiz.updated_at)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update quiz")?;

    Ok(Some(quiz))
}

fn row_to_quiz_sqlite(row: &sqlx::sqlite::SqliteRow) -> Quiz {
    Quiz {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        quiz_type: row.get("quiz_type"),
        category: row.get("category"),
        time_limit: row.get("time_limit"),
        is_active: row.try_get("is_active").unwrap_or(true),
        is_public: row.try_get("is_public").unwrap_or(true),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_quiz_mysql(
    pool: &MySqlPool,
    input: &CreateQuizInput,
    created_by: Option<i64>,
) -> Result<Quiz> {
    let now = Utc::now();

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO quizzes (title, description, quiz_type, category, time_limit, is_active, is_public, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.quiz_type)
    .bind(&input.category)
    .bind(input.time_limit)
    .bind(input.is_active)
    .bind(input.is_public)
    .bind(created_by)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create quiz")?;

    let quiz_id = result.last_insert_id() as i64;

    for (index, question) in input.questions.iter().enumerate() {
        sqlx::query(
            "INSERT INTO quiz_questions (quiz_id, question_id, position, points) VALUES (?, ?, ?, ?)",
        )
        .bind(quiz_id)
        .bind(question.question_id)
        .bind((index + 1) as i64)
        .bind(question.points)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to add question {} to quiz", question.question_id))?;
    }

    tx.commit().await.context("Failed to commit quiz")?;

    Ok(assemble_quiz(quiz_id, input, created_by, now))
}

async fn get_quiz_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Quiz>> {
    let sql = format!("SELECT {} FROM quizzes WHERE id = ?", QUIZ_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get quiz")?;
    Ok(row.map(|row| row_to_quiz_mysql(&row)))
}

async fn get_detail_mysql(
    pool: &MySqlPool,
    id: i64,
    language: Language,
) -> Result<Option<QuizDetail>> {
    let Some(quiz) = get_quiz_mysql(pool, id).await? else {
        return Ok(None);
    };

    let sql = format!(
        "SELECT qq.position, qq.points, {} FROM quiz_questions qq \
         INNER JOIN questions q ON q.id = qq.question_id \
         INNER JOIN question_translations t ON t.question_id = q.id \
         WHERE qq.quiz_id = ? AND t.id = ({}) \
         ORDER BY qq.position ASC",
        QUESTION_COLUMNS, TRANSLATION_PICK
    );

    let rows = sqlx::query(&sql)
        .bind(id)
        .bind(language.to_string())
        .fetch_all(pool)
        .await
        .context("Failed to load quiz questions")?;

    let mut slots = Vec::new();
    for row in &rows {
        let (question, translation) = row_to_question_mysql(row)?;
        let order: i64 = row.get("position");
        let points: i64 = row.get("points");
        slots.push((order, points, question, translation));
    }

    let ids: Vec<i64> = slots.iter().map(|(_, _, q, _)| q.id).collect();
    let mut tags_map = load_tags_mysql(pool, &ids).await?;

    let questions = slots
        .into_iter()
        .map(|(order, points, question, translation)| {
            let tags = tags_map.remove(&question.id).unwrap_or_default();
            QuizQuestionDetail {
                order,
                points,
                question: QuestionWithTranslation {
                    question,
                    translation,
                    tags,
                },
            }
        })
        .collect();

    Ok(Some(QuizDetail { quiz, questions }))
}

async fn list_quizzes_mysql(
    pool: &MySqlPool,
    filter: &QuizFilter,
    params: &ListParams,
) -> Result<PagedResult<QuizSummary>> {
    let (where_sql, binds) = build_filter_sql(filter);

    let sql = format!(
        "SELECT q.id, q.title, q.description, q.quiz_type, q.category, q.time_limit, \
                q.is_active, q.is_public, q.created_by, q.created_at, q.updated_at, \
                u.name AS creator_name, u.email AS creator_email, \
                (SELECT COUNT(*) FROM quiz_questions qq WHERE qq.quiz_id = q.id) AS question_count, \
                (SELECT COUNT(*) FROM quiz_attempts qa WHERE qa.quiz_id = q.id) AS attempt_count \
         FROM quizzes q \
         LEFT JOIN users u ON u.id = q.created_by \
         WHERE {} \
         ORDER BY q.created_at DESC, q.id DESC \
         LIMIT ? OFFSET ?",
        where_sql
    );

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    query = query.bind(params.limit()).bind(params.offset());

    let rows = query.fetch_all(pool).await.context("Failed to list quizzes")?;

    let items = rows
        .iter()
        .map(|row| QuizSummary {
            quiz: row_to_quiz_mysql(row),
            question_count: row.get("question_count"),
            attempt_count: row.get("attempt_count"),
            creator_name: row.get("creator_name"),
            creator_email: row.get("creator_email"),
        })
        .collect();

    let count_sql = format!("SELECT COUNT(*) as count FROM quizzes q WHERE {}", where_sql);
    let mut count_query = sqlx::query(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count quizzes")?
        .get("count");

    Ok(PagedResult::new(items, total, params))
}

async fn update_quiz_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateQuizInput,
) -> Result<Option<Quiz>> {
    let Some(mut quiz) = get_quiz_mysql(pool, id).await? else {
        return Ok(None);
    };
    apply_update(&mut quiz, input);

    sqlx::query(
        r#"
        UPDATE quizzes
        SET title = ?, description = ?, quiz_type = ?, category = ?, time_limit = ?,
            is_active = ?, is_public = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&quiz.title)
    .bind(&quiz.description)
    .bind(&quiz.quiz_type)
    .bind(&quiz.category)
    .bind(quiz.time_limit)
    .bind(quiz.is_active)
    .bind(quiz.is_public)
    .bind(quiz.updated_at)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update quiz")?;

    Ok(Some(quiz))
}

fn row_to_quiz_mysql(row: &sqlx::mysql::MySqlRow) -> Quiz {
    Quiz {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        quiz_type: row.get("quiz_type"),
        category: row.get("category"),
        time_limit: row.get("time_limit"),
        is_active: row.try_get("is_active").unwrap_or(true),
        is_public: row.try_get("is_public").unwrap_or(true),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// ============================================================================
// Shared assembly
// ============================================================================

fn assemble_quiz(
    quiz_id: i64,
    input: &CreateQuizInput,
    created_by: Option<i64>,
    now: chrono::DateTime<Utc>,
) -> Quiz {
    Quiz {
        id: quiz_id,
        title: input.title.clone(),
        description: input.description.clone(),
        quiz_type: input.quiz_type.clone(),
        category: input.category.clone(),
        time_limit: input.time_limit,
        is_active: input.is_active,
        is_public: input.is_public,
        created_by,
        created_at: now,
        updated_at: now,
    }
}
