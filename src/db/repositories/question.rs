//! Question repository
//!
//! Database operations for the question bank. A question spans three tables
//! (questions, question_translations, question_tags); creation writes all
//! three inside one transaction so a failed row never leaves a partial
//! question behind. Reads return the question joined with one translation,
//! preferring the requested language and falling back to English.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    CreateQuestionInput, Language, ListParams, OptionKey, PagedResult, Question,
    QuestionFilter, QuestionTranslation, QuestionWithTranslation,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Question repository trait
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Create a question with its first translation and tags atomically
    async fn create(
        &self,
        input: &CreateQuestionInput,
        created_by: Option<i64>,
    ) -> Result<QuestionWithTranslation>;

    /// Get one question by id with the translation for `language`
    async fn get(&self, id: i64, language: Language) -> Result<Option<QuestionWithTranslation>>;

    /// List active questions matching the filter, newest first
    async fn list(
        &self,
        filter: &QuestionFilter,
        params: &ListParams,
    ) -> Result<PagedResult<QuestionWithTranslation>>;
}

/// SQLx-based question repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxQuestionRepository {
    pool: DynDatabasePool,
}

impl SqlxQuestionRepository {
    /// Create a new SQLx question repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn QuestionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl QuestionRepository for SqlxQuestionRepository {
    async fn create(
        &self,
        input: &CreateQuestionInput,
        created_by: Option<i64>,
    ) -> Result<QuestionWithTranslation> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_question_sqlite(self.pool.as_sqlite().unwrap(), input, created_by).await
            }
            DatabaseDriver::Mysql => {
                create_question_mysql(self.pool.as_mysql().unwrap(), input, created_by).await
            }
        }
    }

    async fn get(&self, id: i64, language: Language) -> Result<Option<QuestionWithTranslation>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_question_sqlite(self.pool.as_sqlite().unwrap(), id, language).await
            }
            DatabaseDriver::Mysql => {
                get_question_mysql(self.pool.as_mysql().unwrap(), id, language).await
            }
        }
    }

    async fn list(
        &self,
        filter: &QuestionFilter,
        params: &ListParams,
    ) -> Result<PagedResult<QuestionWithTranslation>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_questions_sqlite(self.pool.as_sqlite().unwrap(), filter, params).await
            }
            DatabaseDriver::Mysql => {
                list_questions_mysql(self.pool.as_mysql().unwrap(), filter, params).await
            }
        }
    }
}

/// Columns selected for a question joined with one translation
pub(crate) const QUESTION_COLUMNS: &str =
    "q.id, q.question_type, q.category, q.difficulty, q.is_active, q.created_at, q.updated_at, \
     t.id AS translation_id, t.language, t.question_text, t.explanation, \
     t.option_a, t.option_b, t.option_c, t.option_d, t.correct_option_key";

/// Scalar subquery picking one translation row per question: the requested
/// language if present, else English, else any. Binds one language value.
pub(crate) const TRANSLATION_PICK: &str = "SELECT t2.id FROM question_translations t2 \
     WHERE t2.question_id = q.id \
     ORDER BY CASE WHEN t2.language = ? THEN 0 WHEN t2.language = 'en' THEN 1 ELSE 2 END, t2.id \
     LIMIT 1";

/// Build the WHERE clause and bind values for a question listing
fn build_filter_sql(filter: &QuestionFilter) -> (String, Vec<String>) {
    let mut clauses = vec!["q.is_active = 1".to_string()];
    let mut binds = Vec::new();

    if let Some(category) = &filter.category {
        clauses.push("q.category = ?".to_string());
        binds.push(category.clone());
    }
    if let Some(difficulty) = &filter.difficulty {
        clauses.push("q.difficulty = ?".to_string());
        binds.push(difficulty.clone());
    }
    if !filter.tags.is_empty() {
        let placeholders = vec!["?"; filter.tags.len()].join(", ");
        clauses.push(format!(
            "EXISTS (SELECT 1 FROM question_tags qt WHERE qt.question_id = q.id AND qt.tag IN ({}))",
            placeholders
        ));
        binds.extend(filter.tags.iter().cloned());
    }
    if let Some(search) = &filter.search {
        clauses.push(
            "EXISTS (SELECT 1 FROM question_translations ts WHERE ts.question_id = q.id \
             AND ts.language = ? AND ts.question_text LIKE ?)"
                .to_string(),
        );
        binds.push(filter.language.to_string());
        binds.push(format!("%{}%", search));
    }

    (clauses.join(" AND "), binds)
}

/// Trim tags, drop empties, and dedupe while preserving order
fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !seen.iter().any(|s| s == tag) {
            seen.push(tag.to_string());
        }
    }
    seen
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_question_sqlite(
    pool: &SqlitePool,
    input: &CreateQuestionInput,
    created_by: Option<i64>,
) -> Result<QuestionWithTranslation> {
    let now = Utc::now();
    let tags = normalize_tags(&input.tags);

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO questions (question_type, category, difficulty, is_active, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.question_type)
    .bind(&input.category)
    .bind(&input.difficulty)
    .bind(input.is_active)
    .bind(created_by)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create question")?;

    let question_id = result.last_insert_rowid();

    let t = &input.translation;
    let result = sqlx::query(
        r#"
        INSERT INTO question_translations
            (question_id, language, question_text, explanation, option_a, option_b, option_c, option_d, correct_option_key)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(question_id)
    .bind(t.language.to_string())
    .bind(&t.question_text)
    .bind(&t.explanation)
    .bind(&t.option_a)
    .bind(&t.option_b)
    .bind(&t.option_c)
    .bind(&t.option_d)
    .bind(t.correct_option_key.to_string())
    .execute(&mut *tx)
    .await
    .context("Failed to create question translation")?;

    let translation_id = result.last_insert_rowid();

    for tag in &tags {
        sqlx::query("INSERT INTO question_tags (question_id, tag) VALUES (?, ?)")
            .bind(question_id)
            .bind(tag)
            .execute(&mut *tx)
            .await
            .context("Failed to create question tag")?;
    }

    tx.commit().await.context("Failed to commit question")?;

    Ok(assemble_question(question_id, translation_id, input, now, tags))
}

async fn get_question_sqlite(
    pool: &SqlitePool,
    id: i64,
    language: Language,
) -> Result<Option<QuestionWithTranslation>> {
    let sql = format!(
        "SELECT {} FROM questions q \
         INNER JOIN question_translations t ON t.question_id = q.id \
         WHERE q.id = ? AND t.id = ({})",
        QUESTION_COLUMNS, TRANSLATION_PICK
    );

    let row = sqlx::query(&sql)
        .bind(id)
        .bind(language.to_string())
        .fetch_optional(pool)
        .await
        .context("Failed to get question")?;

    match row {
        Some(row) => {
            let (question, translation) = row_to_question_sqlite(&row)?;
            let mut tags_map = load_tags_sqlite(pool, &[question.id]).await?;
            let tags = tags_map.remove(&question.id).unwrap_or_default();
            Ok(Some(QuestionWithTranslation {
                question,
                translation,
                tags,
            }))
        }
        None => Ok(None),
    }
}

async fn list_questions_sqlite(
    pool: &SqlitePool,
    filter: &QuestionFilter,
    params: &ListParams,
) -> Result<PagedResult<QuestionWithTranslation>> {
    let (where_sql, binds) = build_filter_sql(filter);

    let sql = format!(
        "SELECT {} FROM questions q \
         INNER JOIN question_translations t ON t.question_id = q.id \
         WHERE {} AND t.id = ({}) \
         ORDER BY q.created_at DESC, q.id DESC \
         LIMIT ? OFFSET ?",
        QUESTION_COLUMNS, where_sql, TRANSLATION_PICK
    );

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    query = query
        .bind(filter.language.to_string())
        .bind(params.limit())
        .bind(params.offset());

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list questions")?;

    let mut pairs = Vec::new();
    for row in rows {
        pairs.push(row_to_question_sqlite(&row)?);
    }

    let ids: Vec<i64> = pairs.iter().map(|(q, _)| q.id).collect();
    let mut tags_map = load_tags_sqlite(pool, &ids).await?;

    let items = pairs
        .into_iter()
        .map(|(question, translation)| {
            let tags = tags_map.remove(&question.id).unwrap_or_default();
            QuestionWithTranslation {
                question,
                translation,
                tags,
            }
        })
        .collect();

    let count_sql = format!("SELECT COUNT(*) as count FROM questions q WHERE {}", where_sql);
    let mut count_query = sqlx::query(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count questions")?
        .get("count");

    Ok(PagedResult::new(items, total, params))
}

pub(crate) async fn load_tags_sqlite(pool: &SqlitePool, ids: &[i64]) -> Result<HashMap<i64, Vec<String>>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT question_id, tag FROM question_tags WHERE question_id IN ({}) ORDER BY tag",
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load question tags")?;

    let mut map: HashMap<i64, Vec<String>> = HashMap::new();
    for row in rows {
        map.entry(row.get("question_id"))
            .or_default()
            .push(row.get("tag"));
    }

    Ok(map)
}

pub(crate) fn row_to_question_sqlite(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<(Question, QuestionTranslation)> {
    let language_str: String = row.get("language");
    let language = Language::from_str(&language_str).unwrap_or_default();

    let key_str: String = row.get("correct_option_key");
    let correct_option_key = OptionKey::from_str(&key_str)
        .with_context(|| format!("Invalid option key in database: {}", key_str))?;

    let question = Question {
        id: row.get("id"),
        question_type: row.get("question_type"),
        category: row.get("category"),
        difficulty: row.get("difficulty"),
        is_active: row.try_get("is_active").unwrap_or(true),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    };

    let translation = QuestionTranslation {
        id: row.get("translation_id"),
        question_id: question.id,
        language,
        question_text: row.get("question_text"),
        explanation: row.get("explanation"),
        option_a: row.get("option_a"),
        option_b: row.get("option_b"),
        option_c: row.get("option_c"),
        option_d: row.get("option_d"),
        correct_option_key,
    };

    Ok((question, translation))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_question_mysql(
    pool: &MySqlPool,
    input: &CreateQuestionInput,
    created_by: Option<i64>,
) -> Result<QuestionWithTranslation> {
    let now = Utc::now();
    let tags = normalize_tags(&input.tags);

    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let result = sqlx::query(
        r#"
        INSERT INTO questions (question_type, category, difficulty, is_active, created_by, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&input.question_type)
    .bind(&input.category)
    .bind(&input.difficulty)
    .bind(input.is_active)
    .bind(created_by)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to create question")?;

    let question_id = result.last_insert_id() as i64;

    let t = &input.translation;
    let result = sqlx::query(
        r#"
        INSERT INTO question_translations
            (question_id, language, question_text, explanation, option_a, option_b, option_c, option_d, correct_option_key)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(question_id)
    .bind(t.language.to_string())
    .bind(&t.question_text)
    .bind(&t.explanation)
    .bind(&t.option_a)
    .bind(&t.option_b)
    .bind(&t.option_c)
    .bind(&t.option_d)
    .bind(t.correct_option_key.to_string())
    .execute(&mut *tx)
    .await
    .context("Failed to create question translation")?;

    let translation_id = result.last_insert_id() as i64;

    for tag in &tags {
        sqlx::query("INSERT INTO question_tags (question_id, tag) VALUES (?, ?)")
            .bind(question_id)
            .bind(tag)
            .execute(&mut *tx)
            .await
            .context("Failed to create question tag")?;
    }

    tx.commit().await.context("Failed to commit question")?;

    Ok(assemble_question(question_id, translation_id, input, now, tags))
}

async fn get_question_mysql(
    pool: &MySqlPool,
    id: i64,
    language: Language,
) -> Result<Option<QuestionWithTranslation>> {
    let sql = format!(
        "SELECT {} FROM questions q \
         INNER JOIN question_translations t ON t.question_id = q.id \
         WHERE q.id = ? AND t.id = ({})",
        QUESTION_COLUMNS, TRANSLATION_PICK
    );

    let row = sqlx::query(&sql)
        .bind(id)
        .bind(language.to_string())
        .fetch_optional(pool)
        .await
        .context("Failed to get question")?;

    match row {
        Some(row) => {
            let (question, translation) = row_to_question_mysql(&row)?;
            let mut tags_map = load_tags_mysql(pool, &[question.id]).await?;
            let tags = tags_map.remove(&question.id).unwrap_or_default();
            Ok(Some(QuestionWithTranslation {
                question,
                translation,
                tags,
            }))
        }
        None => Ok(None),
    }
}

async fn list_questions_mysql(
    pool: &MySqlPool,
    filter: &QuestionFilter,
    params: &ListParams,
) -> Result<PagedResult<QuestionWithTranslation>> {
    let (where_sql, binds) = build_filter_sql(filter);

    let sql = format!(
        "SELECT {} FROM questions q \
         INNER JOIN question_translations t ON t.question_id = q.id \
         WHERE {} AND t.id = ({}) \
         ORDER BY q.created_at DESC, q.id DESC \
         LIMIT ? OFFSET ?",
        QUESTION_COLUMNS, where_sql, TRANSLATION_PICK
    );

    let mut query = sqlx::query(&sql);
    for bind in &binds {
        query = query.bind(bind);
    }
    query = query
        .bind(filter.language.to_string())
        .bind(params.limit())
        .bind(params.offset());

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to list questions")?;

    let mut pairs = Vec::new();
    for row in rows {
        pairs.push(row_to_question_mysql(&row)?);
    }

    let ids: Vec<i64> = pairs.iter().map(|(q, _)| q.id).collect();
    let mut tags_map = load_tags_mysql(pool, &ids).await?;

    let items = pairs
        .into_iter()
        .map(|(question, translation)| {
            let tags = tags_map.remove(&question.id).unwrap_or_default();
            QuestionWithTranslation {
                question,
                translation,
                tags,
            }
        })
        .collect();

    let count_sql = format!("SELECT COUNT(*) as count FROM questions q WHERE {}", where_sql);
    let mut count_query = sqlx::query(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total: i64 = count_query
        .fetch_one(pool)
        .await
        .context("Failed to count questions")?
        .get("count");

    Ok(PagedResult::new(items, total, params))
}

pub(crate) async fn load_tags_mysql(pool: &MySqlPool, ids: &[i64]) -> Result<HashMap<i64, Vec<String>>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT question_id, tag FROM question_tags WHERE question_id IN ({}) ORDER BY tag",
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(id);
    }

    let rows = query
        .fetch_all(pool)
        .await
        .context("Failed to load question tags")?;

    let mut map: HashMap<i64, Vec<String>> = HashMap::new();
    for row in rows {
        map.entry(row.get("question_id"))
            .or_default()
            .push(row.get("tag"));
    }

    Ok(map)
}

pub(crate) fn row_to_question_mysql(row: &sqlx::mysql::MySqlRow) -> Result<(Question, QuestionTranslation)> {
    let language_str: String = row.get("language");
    let language = Language::from_str(&language_str).unwrap_or_default();

    let key_str: String = row.get("correct_option_key");
    let correct_option_key = OptionKey::from_str(&key_str)
        .with_context(|| format!("Invalid option key in database: {}", key_str))?;

    let question = Question {
        id: row.get("id"),
        question_type: row.get("question_type"),
        category: row.get("category"),
        difficulty: row.get("difficulty"),
        is_active: row.try_get("is_active").unwrap_or(true),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    };

    let translation = QuestionTranslation {
        id: row.get("translation_id"),
        question_id: question.id,
        language,
        question_text: row.get("question_text"),
        explanation: row.get("explanation"),
        option_a: row.get("option_a"),
        option_b: row.get("option_b"),
        option_c: row.get("option_c"),
        option_d: row.get("option_d"),
        correct_option_key,
    };

    Ok((question, translation))
}

// ============================================================================
// Shared assembly
// ============================================================================

fn assemble_question(
    question_id: i64,
    translation_id: i64,
    input: &CreateQuestionInput,
    now: chrono::DateTime<Utc>,
    tags: Vec<String>,
) -> QuestionWithTranslation {
    let t = &input.translation;
    QuestionWithTranslation {
        question: Question {
            id: question_id,
            question_type: input.question_type.clone(),
            category: input.category.clone(),
            difficulty: input.difficulty.clone(),
            is_active: input.is_active,
            created_at: now,
            updated_at: now,
        },
        translation: QuestionTranslation {
            id: translation_id,
            question_id,
            language: t.language,
            question_text: t.question_text.clone(),
            explanation: t.explanation.clone(),
            option_a: t.option_a.clone(),
            option_b: t.option_b.clone(),
            option_c: t.option_c.clone(),
            option_d: t.option_d.clone(),
            correct_option_key: t.correct_option_key,
        },
        tags,
    }
}
