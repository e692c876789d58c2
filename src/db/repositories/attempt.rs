//! Quiz attempt repository
//!
//! Storage for the attempt state machine. Answering and completing both run
//! inside a transaction that re-checks `is_completed`, and the completion
//! update itself is guarded with `WHERE is_completed = 0` so two racing
//! completions can never both score the attempt. Re-answering a question
//! replaces the previous row via the (attempt_id, question_id) unique key.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    AnswerOutcome, AttemptOwner, AttemptResults, CompleteOutcome, GuestStats, OptionKey,
    QuestionAttempt, QuizAttempt,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

/// Quiz attempt repository trait
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Start an attempt with the quiz's points snapshotted
    async fn create(
        &self,
        quiz_id: i64,
        owner: &AttemptOwner,
        total_points: i64,
    ) -> Result<QuizAttempt>;

    /// Get one attempt by id
    async fn get(&self, id: i64) -> Result<Option<QuizAttempt>>;

    /// Answers recorded for an attempt, oldest first
    async fn get_answers(&self, attempt_id: i64) -> Result<Vec<QuestionAttempt>>;

    /// Insert or replace an answer; rejected once the attempt is completed
    async fn record_answer(
        &self,
        attempt_id: i64,
        question_id: i64,
        selected_option: OptionKey,
        is_correct: bool,
        time_spent: Option<i64>,
    ) -> Result<AnswerOutcome>;

    /// Score and close an attempt; rejected when already completed
    async fn complete(&self, attempt_id: i64) -> Result<CompleteOutcome>;

    /// Reassign all unowned attempts of a guest to a user, returning how many moved
    async fn merge_guest(&self, guest_id: &str, user_id: i64) -> Result<i64>;

    /// Aggregate statistics for one guest id
    async fn guest_stats(&self, guest_id: &str) -> Result<GuestStats>;

    /// Delete stale guest attempts: completed ones started before
    /// `completed_before`, incomplete ones started before `incomplete_before`
    async fn cleanup_guest_attempts(
        &self,
        completed_before: DateTime<Utc>,
        incomplete_before: DateTime<Utc>,
    ) -> Result<u64>;
}

/// SQLx-based attempt repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxAttemptRepository {
    pool: DynDatabasePool,
}

impl SqlxAttemptRepository {
    /// Create a new SQLx attempt repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AttemptRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AttemptRepository for SqlxAttemptRepository {
    async fn create(
        &self,
        quiz_id: i64,
        owner: &AttemptOwner,
        total_points: i64,
    ) -> Result<QuizAttempt> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_attempt_sqlite(self.pool.as_sqlite().unwrap(), quiz_id, owner, total_points)
                    .await
            }
            DatabaseDriver::Mysql => {
                create_attempt_mysql(self.pool.as_mysql().unwrap(), quiz_id, owner, total_points)
                    .await
            }
        }
    }

    async fn get(&self, id: i64) -> Result<Option<QuizAttempt>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let sql = format!("SELECT {} FROM quiz_attempts WHERE id = ?", ATTEMPT_COLUMNS);
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to get attempt")?;
                Ok(row.map(|row| row_to_attempt_sqlite(&row)))
            }
            DatabaseDriver::Mysql => {
                let sql = format!("SELECT {} FROM quiz_attempts WHERE id = ?", ATTEMPT_COLUMNS);
                let row = sqlx::query(&sql)
                    .bind(id)
                    .fetch_optional(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to get attempt")?;
                Ok(row.map(|row| row_to_attempt_mysql(&row)))
            }
        }
    }

    async fn get_answers(&self, attempt_id: i64) -> Result<Vec<QuestionAttempt>> {
        let sql = format!(
            "SELECT {} FROM question_attempts WHERE attempt_id = ? ORDER BY answered_at ASC, id ASC",
            ANSWER_COLUMNS
        );
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(&sql)
                    .bind(attempt_id)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to load answers")?;
                rows.iter().map(row_to_answer_sqlite).collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(&sql)
                    .bind(attempt_id)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to load answers")?;
                rows.iter().map(row_to_answer_mysql).collect()
            }
        }
    }

    async fn record_answer(
        &self,
        attempt_id: i64,
        question_id: i64,
        selected_option: OptionKey,
        is_correct: bool,
        time_spent: Option<i64>,
    ) -> Result<AnswerOutcome> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                record_answer_sqlite(
                    self.pool.as_sqlite().unwrap(),
                    attempt_id,
                    question_id,
                    selected_option,
                    is_correct,
                    time_spent,
                )
                .await
            }
            DatabaseDriver::Mysql => {
                record_answer_mysql(
                    self.pool.as_mysql().unwrap(),
                    attempt_id,
                    question_id,
                    selected_option,
                    is_correct,
                    time_spent,
                )
                .await
            }
        }
    }

    async fn complete(&self, attempt_id: i64) -> Result<CompleteOutcome> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                complete_attempt_sqlite(self.pool.as_sqlite().unwrap(), attempt_id).await
            }
            DatabaseDriver::Mysql => {
                complete_attempt_mysql(self.pool.as_mysql().unwrap(), attempt_id).await
            }
        }
    }

    async fn merge_guest(&self, guest_id: &str, user_id: i64) -> Result<i64> {
        let sql = "UPDATE quiz_attempts SET user_id = ?, guest_id = NULL \
                   WHERE guest_id = ? AND user_id IS NULL";
        let affected = match self.pool.driver() {
            DatabaseDriver::Sqlite => sqlx::query(sql)
                .bind(user_id)
                .bind(guest_id)
                .execute(self.pool.as_sqlite().unwrap())
                .await
                .context("Failed to merge guest attempts")?
                .rows_affected(),
            DatabaseDriver::Mysql => sqlx::query(sql)
                .bind(user_id)
                .bind(guest_id)
                .execute(self.pool.as_mysql().unwrap())
                .await
                .context("Failed to merge guest attempts")?
                .rows_affected(),
        };
        Ok(affected as i64)
    }

    async fn guest_stats(&self, guest_id: &str) -> Result<GuestStats> {
        let sql = "SELECT is_completed, score, total_points FROM quiz_attempts WHERE guest_id = ?";
        let rows: Vec<(bool, Option<i64>, i64)> = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let rows = sqlx::query(sql)
                    .bind(guest_id)
                    .fetch_all(self.pool.as_sqlite().unwrap())
                    .await
                    .context("Failed to load guest attempts")?;
                rows.iter()
                    .map(|row| {
                        (
                            row.try_get("is_completed").unwrap_or(false),
                            row.get("score"),
                            row.get("total_points"),
                        )
                    })
                    .collect()
            }
            DatabaseDriver::Mysql => {
                let rows = sqlx::query(sql)
                    .bind(guest_id)
                    .fetch_all(self.pool.as_mysql().unwrap())
                    .await
                    .context("Failed to load guest attempts")?;
                rows.iter()
                    .map(|row| {
                        (
                            row.try_get("is_completed").unwrap_or(false),
                            row.get("score"),
                            row.get("total_points"),
                        )
                    })
                    .collect()
            }
        };

        Ok(compute_guest_stats(&rows))
    }

    async fn cleanup_guest_attempts(
        &self,
        completed_before: DateTime<Utc>,
        incomplete_before: DateTime<Utc>,
    ) -> Result<u64> {
        let completed_sql = "DELETE FROM quiz_attempts \
             WHERE guest_id IS NOT NULL AND is_completed = 1 AND started_at < ?";
        let incomplete_sql = "DELETE FROM quiz_attempts \
             WHERE guest_id IS NOT NULL AND is_completed = 0 AND started_at < ?";

        let deleted = match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                let pool = self.pool.as_sqlite().unwrap();
                let completed = sqlx::query(completed_sql)
                    .bind(completed_before)
                    .execute(pool)
                    .await
                    .context("Failed to delete stale completed guest attempts")?
                    .rows_affected();
                let incomplete = sqlx::query(incomplete_sql)
                    .bind(incomplete_before)
                    .execute(pool)
                    .await
                    .context("Failed to delete stale incomplete guest attempts")?
                    .rows_affected();
                completed + incomplete
            }
            DatabaseDriver::Mysql => {
                let pool = self.pool.as_mysql().unwrap();
                let completed = sqlx::query(completed_sql)
                    .bind(completed_before)
                    .execute(pool)
                    .await
                    .context("Failed to delete stale completed guest attempts")?
                    .rows_affected();
                let incomplete = sqlx::query(incomplete_sql)
                    .bind(incomplete_before)
                    .execute(pool)
                    .await
                    .context("Failed to delete stale incomplete guest attempts")?
                    .rows_affected();
                completed + incomplete
            }
        };

        Ok(deleted)
    }
}

/// Columns selected for an attempt row
const ATTEMPT_COLUMNS: &str = "id, quiz_id, user_id, guest_id, score, total_points, \
     time_taken, started_at, completed_at, is_completed";

/// Columns selected for an answer row
const ANSWER_COLUMNS: &str =
    "id, attempt_id, question_id, selected_option, is_correct, time_spent, answered_at";

/// Points earned: the answered-correct ratio scaled to the snapshot, rounded
fn compute_score(correct: i64, answered: i64, total_points: i64) -> i64 {
    if answered == 0 {
        return 0;
    }
    ((correct as f64 / answered as f64) * total_points as f64).round() as i64
}

fn compute_percentage(score: i64, total_points: i64) -> i64 {
    if total_points == 0 {
        return 0;
    }
    ((score as f64 / total_points as f64) * 100.0).round() as i64
}

/// Fold (is_completed, score, total_points) rows into guest statistics.
///
/// The average is the mean score percentage over completed attempts that
/// have a score, rounded to 2 decimal places. Attempts with a zero points
/// snapshot contribute 0% rather than dividing by zero.
fn compute_guest_stats(rows: &[(bool, Option<i64>, i64)]) -> GuestStats {
    let total_quizzes = rows.len() as i64;
    let mut completed_quizzes = 0i64;
    let mut scored = 0i64;
    let mut sum = 0f64;

    for &(is_completed, score, total_points) in rows {
        if !is_completed {
            continue;
        }
        completed_quizzes += 1;
        if let Some(score) = score {
            scored += 1;
            if total_points > 0 {
                sum += score as f64 * 100.0 / total_points as f64;
            }
        }
    }

    let average_score = if scored > 0 {
        (sum / scored as f64 * 100.0).round() / 100.0
    } else {
        0.0
    };

    GuestStats {
        total_quizzes,
        completed_quizzes,
        average_score,
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_attempt_sqlite(
    pool: &SqlitePool,
    quiz_id: i64,
    owner: &AttemptOwner,
    total_points: i64,
) -> Result<QuizAttempt> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO quiz_attempts (quiz_id, user_id, guest_id, total_points, started_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(quiz_id)
    .bind(owner.user_id())
    .bind(owner.guest_id())
    .bind(total_points)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create attempt")?;

    Ok(assemble_attempt(
        result.last_insert_rowid(),
        quiz_id,
        owner,
        total_points,
        now,
    ))
}

async fn record_answer_sqlite(
    pool: &SqlitePool,
    attempt_id: i64,
    question_id: i64,
    selected_option: OptionKey,
    is_correct: bool,
    time_spent: Option<i64>,
) -> Result<AnswerOutcome> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let attempt = sqlx::query("SELECT is_completed FROM quiz_attempts WHERE id = ?")
        .bind(attempt_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to check attempt")?;

    let Some(attempt) = attempt else {
        return Ok(AnswerOutcome::AttemptNotFound);
    };
    if attempt.try_get("is_completed").unwrap_or(false) {
        return Ok(AnswerOutcome::AlreadyCompleted);
    }

    let now = Utc::now();
    sqlx::query(
        "INSERT INTO question_attempts \
             (attempt_id, question_id, selected_option, is_correct, time_spent, answered_at) \
         VALUES (?, ?, ?, ?, ?, ?) \
         ON CONFLICT(attempt_id, question_id) DO UPDATE SET \
             selected_option = excluded.selected_option, \
             is_correct = excluded.is_correct, \
             time_spent = excluded.time_spent, \
             answered_at = excluded.answered_at",
    )
    .bind(attempt_id)
    .bind(question_id)
    .bind(selected_option.to_string())
    .bind(is_correct)
    .bind(time_spent)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to record answer")?;

    let sql = format!(
        "SELECT {} FROM question_attempts WHERE attempt_id = ? AND question_id = ?",
        ANSWER_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(attempt_id)
        .bind(question_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to read back answer")?;

    tx.commit().await.context("Failed to commit answer")?;

    Ok(AnswerOutcome::Recorded(row_to_answer_sqlite(&row)?))
}

async fn complete_attempt_sqlite(pool: &SqlitePool, attempt_id: i64) -> Result<CompleteOutcome> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let sql = format!("SELECT {} FROM quiz_attempts WHERE id = ?", ATTEMPT_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(attempt_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to load attempt")?;

    let Some(row) = row else {
        return Ok(CompleteOutcome::AttemptNotFound);
    };
    let mut attempt = row_to_attempt_sqlite(&row);
    if attempt.is_completed {
        return Ok(CompleteOutcome::AlreadyCompleted);
    }

    let counts = sqlx::query(
        "SELECT COUNT(*) AS answered, COUNT(CASE WHEN is_correct = 1 THEN 1 END) AS correct \
         FROM question_attempts WHERE attempt_id = ?",
    )
    .bind(attempt_id)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to count answers")?;
    let answered: i64 = counts.get("answered");
    let correct: i64 = counts.get("correct");

    let score = compute_score(correct, answered, attempt.total_points);
    let now = Utc::now();
    let time_taken = (now - attempt.started_at).num_seconds().max(0);

    // Guarded against a racing completion on the same attempt
    let updated = sqlx::query(
        "UPDATE quiz_attempts SET score = ?, time_taken = ?, completed_at = ?, is_completed = 1 \
         WHERE id = ? AND is_completed = 0",
    )
    .bind(score)
    .bind(time_taken)
    .bind(now)
    .bind(attempt_id)
    .execute(&mut *tx)
    .await
    .context("Failed to complete attempt")?;

    if updated.rows_affected() == 0 {
        return Ok(CompleteOutcome::AlreadyCompleted);
    }

    tx.commit().await.context("Failed to commit completion")?;

    attempt.score = Some(score);
    attempt.time_taken = Some(time_taken);
    attempt.completed_at = Some(now);
    attempt.is_completed = true;

    let results = AttemptResults {
        score,
        total_points: attempt.total_points,
        percentage: compute_percentage(score, attempt.total_points),
        time_taken,
        correct_answers: correct,
        total_questions: answered,
    };

    Ok(CompleteOutcome::Completed { attempt, results })
}

fn row_to_attempt_sqlite(row: &sqlx::sqlite::SqliteRow) -> QuizAttempt {
    QuizAttempt {
        id: row.get("id"),
        quiz_id: row.get("quiz_id"),
        user_id: row.get("user_id"),
        guest_id: row.get("guest_id"),
        score: row.get("score"),
        total_points: row.get("total_points"),
        time_taken: row.get("time_taken"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        is_completed: row.try_get("is_completed").unwrap_or(false),
    }
}

fn row_to_answer_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<QuestionAttempt> {
    let selected: Option<String> = row.get("selected_option");
    let selected_option = selected
        .map(|s| {
            OptionKey::from_str(&s)
                .with_context(|| format!("Invalid option key in database: {}", s))
        })
        .transpose()?;

    Ok(QuestionAttempt {
        id: row.get("id"),
        quiz_attempt_id: row.get("attempt_id"),
        question_id: row.get("question_id"),
        selected_option,
        is_correct: row.get("is_correct"),
        time_spent: row.get("time_spent"),
        answered_at: row.get("answered_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_attempt_mysql(
    pool: &MySqlPool,
    quiz_id: i64,
    owner: &AttemptOwner,
    total_points: i64,
) -> Result<QuizAttempt> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO quiz_attempts (quiz_id, user_id, guest_id, total_points, started_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(quiz_id)
    .bind(owner.user_id())
    .bind(owner.guest_id())
    .bind(total_points)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create attempt")?;

    Ok(assemble_attempt(
        result.last_insert_id() as i64,
        quiz_id,
        owner,
        total_points,
        now,
    ))
}

async fn record_answer_mysql(
    pool: &MySqlPool,
    attempt_id: i64,
    question_id: i64,
    selected_option: OptionKey,
    is_correct: bool,
    time_spent: Option<i64>,
) -> Result<AnswerOutcome> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    // Lock the attempt row so a concurrent completion waits for this answer
    let attempt = sqlx::query("SELECT is_completed FROM quiz_attempts WHERE id = ? FOR UPDATE")
        .bind(attempt_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to check attempt")?;

    let Some(attempt) = attempt else {
        return Ok(AnswerOutcome::AttemptNotFound);
    };
    if attempt.try_get("is_completed").unwrap_or(false) {
        return Ok(AnswerOutcome::AlreadyCompleted);
    }

    let now = Utc::now();
    sqlx::query(
        "INSERT INTO question_attempts \
             (attempt_id, question_id, selected_option, is_correct, time_spent, answered_at) \
         VALUES (?, ?, ?, ?, ?, ?) \
         ON DUPLICATE KEY UPDATE \
             selected_option = VALUES(selected_option), \
             is_correct = VALUES(is_correct), \
             time_spent = VALUES(time_spent), \
             answered_at = VALUES(answered_at)",
    )
    .bind(attempt_id)
    .bind(question_id)
    .bind(selected_option.to_string())
    .bind(is_correct)
    .bind(time_spent)
    .bind(now)
    .execute(&mut *tx)
    .await
    .context("Failed to record answer")?;

    let sql = format!(
        "SELECT {} FROM question_attempts WHERE attempt_id = ? AND question_id = ?",
        ANSWER_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(attempt_id)
        .bind(question_id)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to read back answer")?;

    tx.commit().await.context("Failed to commit answer")?;

    Ok(AnswerOutcome::Recorded(row_to_answer_mysql(&row)?))
}

async fn complete_attempt_mysql(pool: &MySqlPool, attempt_id: i64) -> Result<CompleteOutcome> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    let sql = format!(
        "SELECT {} FROM quiz_attempts WHERE id = ? FOR UPDATE",
        ATTEMPT_COLUMNS
    );
    let row = sqlx::query(&sql)
        .bind(attempt_id)
        .fetch_optional(&mut *tx)
        .await
        .context("Failed to load attempt")?;

    let Some(row) = row else {
        return Ok(CompleteOutcome::AttemptNotFound);
    };
    let mut attempt = row_to_attempt_mysql(&row);
    if attempt.is_completed {
        return Ok(CompleteOutcome::AlreadyCompleted);
    }

    let counts = sqlx::query(
        "SELECT COUNT(*) AS answered, COUNT(CASE WHEN is_correct = 1 THEN 1 END) AS correct \
         FROM question_attempts WHERE attempt_id = ?",
    )
    .bind(attempt_id)
    .fetch_one(&mut *tx)
    .await
    .context("Failed to count answers")?;
    let answered: i64 = counts.get("answered");
    let correct: i64 = counts.get("correct");

    let score = compute_score(correct, answered, attempt.total_points);
    let now = Utc::now();
    let time_taken = (now - attempt.started_at).num_seconds().max(0);

    let updated = sqlx::query(
        "UPDATE quiz_attempts SET score = ?, time_taken = ?, completed_at = ?, is_completed = 1 \
         WHERE id = ? AND is_completed = 0",
    )
    .bind(score)
    .bind(time_taken)
    .bind(now)
    .bind(attempt_id)
    .execute(&mut *tx)
    .await
    .context("Failed to complete attempt")?;

    if updated.rows_affected() == 0 {
        return Ok(CompleteOutcome::AlreadyCompleted);
    }

    tx.commit().await.context("Failed to commit completion")?;

    attempt.score = Some(score);
    attempt.time_taken = Some(time_taken);
    attempt.completed_at = Some(now);
    attempt.is_completed = true;

    let results = AttemptResults {
        score,
        total_points: attempt.total_points,
        percentage: compute_percentage(score, attempt.total_points),
        time_taken,
        correct_answers: correct,
        total_questions: answered,
    };

    Ok(CompleteOutcome::Completed { attempt, results })
}

fn row_to_attempt_mysql(row: &sqlx::mysql::MySqlRow) -> QuizAttempt {
    QuizAttempt {
        id: row.get("id"),
        quiz_id: row.get("quiz_id"),
        user_id: row.get("user_id"),
        guest_id: row.get("guest_id"),
        score: row.get("score"),
        total_points: row.get("total_points"),
        time_taken: row.get("time_taken"),
        started_at: row.get("started_at"),
        completed_at: row.get("completed_at"),
        is_completed: row.try_get("is_completed").unwrap_or(false),
    }
}

fn row_to_answer_mysql(row: &sqlx::mysql::MySqlRow) -> Result<QuestionAttempt> {
    let selected: Option<String> = row.get("selected_option");
    let selected_option = selected
        .map(|s| {
            OptionKey::from_str(&s)
                .with_context(|| format!("Invalid option key in database: {}", s))
        })
        .transpose()?;

    Ok(QuestionAttempt {
        id: row.get("id"),
        quiz_attempt_id: row.get("attempt_id"),
        question_id: row.get("question_id"),
        selected_option,
        is_correct: row.get("is_correct"),
        time_spent: row.get("time_spent"),
        answered_at: row.get("answered_at"),
    })
}

// ============================================================================
// Shared assembly
// ============================================================================

fn assemble_attempt(
    id: i64,
    quiz_id: i64,
    owner: &AttemptOwner,
    total_points: i64,
    now: DateTime<Utc>,
) -> QuizAttempt {
    QuizAttempt {
        id,
        quiz_id,
        user_id: owner.user_id(),
        guest_id: owner.guest_id().map(String::from),
        score: None,
        total_points,
        time_taken: None,
        started_at: now,
        completed_at: None,
        is_completed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::question::{QuestionRepository, SqlxQuestionRepository};
    use crate::db::repositories::quiz::{QuizRepository, SqlxQuizRepository};
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{
        CreateQuestionInput, CreateQuizInput, CreateTranslationInput, Language, QuizQuestionInput,
    };

    async fn setup_test_repo() -> (DynDatabasePool, SqlxAttemptRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxAttemptRepository::new(pool.clone());
        (pool, repo)
    }

    /// Create a quiz with `count` one-point questions, returning (quiz_id, question_ids)
    async fn seed_quiz(pool: &DynDatabasePool, count: usize) -> (i64, Vec<i64>) {
        let questions = SqlxQuestionRepository::new(pool.clone());
        let mut question_ids = Vec::new();
        for i in 0..count {
            let input = CreateQuestionInput {
                question_type: "mcq".to_string(),
                category: None,
                difficulty: None,
                is_active: true,
                tags: vec![],
                translation: CreateTranslationInput {
                    language: Language::En,
                    question_text: format!("Question {}", i + 1),
                    explanation: None,
                    option_a: "a".to_string(),
                    option_b: "b".to_string(),
                    option_c: "c".to_string(),
                    option_d: "d".to_string(),
                    correct_option_key: OptionKey::A,
                },
            };
            let created = questions
                .create(&input, None)
                .await
                .expect("Failed to create question");
            question_ids.push(created.question.id);
        }

        let quizzes = SqlxQuizRepository::new(pool.clone());
        let quiz = quizzes
            .create(
                &CreateQuizInput {
                    title: "Attempt fixture".to_string(),
                    description: None,
                    quiz_type: None,
                    category: None,
                    time_limit: None,
                    is_active: true,
                    is_public: true,
                    questions: question_ids
                        .iter()
                        .map(|&question_id| QuizQuestionInput {
                            question_id,
                            points: 1,
                        })
                        .collect(),
                },
                None,
            )
            .await
            .expect("Failed to create quiz");

        (quiz.id, question_ids)
    }

    fn guest() -> AttemptOwner {
        AttemptOwner::Guest("guest_1700000000_test".to_string())
    }

    #[tokio::test]
    async fn test_create_guest_attempt() {
        let (pool, repo) = setup_test_repo().await;
        let (quiz_id, _) = seed_quiz(&pool, 2).await;

        let attempt = repo
            .create(quiz_id, &guest(), 2)
            .await
            .expect("Failed to create attempt");

        assert!(attempt.id > 0);
        assert_eq!(attempt.total_points, 2);
        assert_eq!(attempt.guest_id.as_deref(), Some("guest_1700000000_test"));
        assert!(attempt.user_id.is_none());
        assert!(!attempt.is_completed);
        assert!(attempt.score.is_none());

        let reloaded = repo.get(attempt.id).await.unwrap().unwrap();
        assert_eq!(reloaded.quiz_id, quiz_id);
        assert!(!reloaded.is_completed);
    }

    #[tokio::test]
    async fn test_create_user_attempt() {
        let (pool, repo) = setup_test_repo().await;
        sqlx::query("INSERT INTO users (id, email) VALUES (5, 'taker@example.com')")
            .execute(pool.as_sqlite().unwrap())
            .await
            .expect("Failed to insert user");
        let (quiz_id, _) = seed_quiz(&pool, 1).await;

        let attempt = repo
            .create(quiz_id, &AttemptOwner::User(5), 1)
            .await
            .expect("Failed to create attempt");

        assert_eq!(attempt.user_id, Some(5));
        assert!(attempt.guest_id.is_none());
    }

    #[tokio::test]
    async fn test_record_answer_replaces_previous() {
        let (pool, repo) = setup_test_repo().await;
        let (quiz_id, question_ids) = seed_quiz(&pool, 1).await;
        let attempt = repo.create(quiz_id, &guest(), 1).await.unwrap();

        let first = repo
            .record_answer(attempt.id, question_ids[0], OptionKey::B, false, Some(10))
            .await
            .expect("Failed to record answer");
        let AnswerOutcome::Recorded(first) = first else {
            panic!("Expected recorded answer");
        };
        assert_eq!(first.selected_option, Some(OptionKey::B));
        assert_eq!(first.is_correct, Some(false));

        let second = repo
            .record_answer(attempt.id, question_ids[0], OptionKey::A, true, Some(25))
            .await
            .expect("Failed to record answer");
        let AnswerOutcome::Recorded(second) = second else {
            panic!("Expected recorded answer");
        };
        assert_eq!(second.id, first.id);
        assert_eq!(second.selected_option, Some(OptionKey::A));
        assert_eq!(second.is_correct, Some(true));
        assert_eq!(second.time_spent, Some(25));

        let answers = repo.get_answers(attempt.id).await.unwrap();
        assert_eq!(answers.len(), 1);
    }

    #[tokio::test]
    async fn test_record_answer_unknown_attempt() {
        let (_pool, repo) = setup_test_repo().await;

        let outcome = repo
            .record_answer(999, 1, OptionKey::A, true, None)
            .await
            .expect("Failed to record answer");

        assert!(matches!(outcome, AnswerOutcome::AttemptNotFound));
    }

    #[tokio::test]
    async fn test_record_answer_after_completion_rejected() {
        let (pool, repo) = setup_test_repo().await;
        let (quiz_id, question_ids) = seed_quiz(&pool, 1).await;
        let attempt = repo.create(quiz_id, &guest(), 1).await.unwrap();

        repo.record_answer(attempt.id, question_ids[0], OptionKey::A, true, None)
            .await
            .unwrap();
        repo.complete(attempt.id).await.unwrap();

        let outcome = repo
            .record_answer(attempt.id, question_ids[0], OptionKey::C, false, None)
            .await
            .expect("Failed to record answer");
        assert!(matches!(outcome, AnswerOutcome::AlreadyCompleted));

        // The original answer is untouched
        let answers = repo.get_answers(attempt.id).await.unwrap();
        assert_eq!(answers[0].selected_option, Some(OptionKey::A));
    }

    #[tokio::test]
    async fn test_complete_scores_attempt() {
        let (pool, repo) = setup_test_repo().await;
        let (quiz_id, question_ids) = seed_quiz(&pool, 2).await;
        let attempt = repo.create(quiz_id, &guest(), 2).await.unwrap();

        repo.record_answer(attempt.id, question_ids[0], OptionKey::A, true, Some(5))
            .await
            .unwrap();
        repo.record_answer(attempt.id, question_ids[1], OptionKey::D, false, Some(7))
            .await
            .unwrap();

        let outcome = repo.complete(attempt.id).await.expect("Failed to complete");
        let CompleteOutcome::Completed { attempt, results } = outcome else {
            panic!("Expected completion");
        };

        assert!(attempt.is_completed);
        assert_eq!(attempt.score, Some(1));
        assert!(attempt.completed_at.is_some());
        assert!(attempt.time_taken.unwrap() >= 0);

        assert_eq!(results.score, 1);
        assert_eq!(results.total_points, 2);
        assert_eq!(results.percentage, 50);
        assert_eq!(results.correct_answers, 1);
        assert_eq!(results.total_questions, 2);
    }

    #[tokio::test]
    async fn test_complete_rounds_half_up() {
        let (pool, repo) = setup_test_repo().await;
        let (quiz_id, question_ids) = seed_quiz(&pool, 3).await;
        // 3-point snapshot, 1 correct of 2 answered: 1.5 rounds to 2
        let attempt = repo.create(quiz_id, &guest(), 3).await.unwrap();

        repo.record_answer(attempt.id, question_ids[0], OptionKey::A, true, None)
            .await
            .unwrap();
        repo.record_answer(attempt.id, question_ids[1], OptionKey::B, false, None)
            .await
            .unwrap();

        let CompleteOutcome::Completed { results, .. } =
            repo.complete(attempt.id).await.unwrap()
        else {
            panic!("Expected completion");
        };
        assert_eq!(results.score, 2);
        assert_eq!(results.percentage, 67);
    }

    #[tokio::test]
    async fn test_complete_with_no_answers() {
        let (pool, repo) = setup_test_repo().await;
        let (quiz_id, _) = seed_quiz(&pool, 2).await;
        let attempt = repo.create(quiz_id, &guest(), 2).await.unwrap();

        let CompleteOutcome::Completed { results, .. } =
            repo.complete(attempt.id).await.unwrap()
        else {
            panic!("Expected completion");
        };
        assert_eq!(results.score, 0);
        assert_eq!(results.percentage, 0);
        assert_eq!(results.total_questions, 0);
    }

    #[tokio::test]
    async fn test_complete_twice_rejected() {
        let (pool, repo) = setup_test_repo().await;
        let (quiz_id, _) = seed_quiz(&pool, 1).await;
        let attempt = repo.create(quiz_id, &guest(), 1).await.unwrap();

        repo.complete(attempt.id).await.unwrap();
        let outcome = repo.complete(attempt.id).await.unwrap();
        assert!(matches!(outcome, CompleteOutcome::AlreadyCompleted));
    }

    #[tokio::test]
    async fn test_complete_unknown_attempt() {
        let (_pool, repo) = setup_test_repo().await;
        let outcome = repo.complete(999).await.unwrap();
        assert!(matches!(outcome, CompleteOutcome::AttemptNotFound));
    }

    #[tokio::test]
    async fn test_merge_guest_attempts() {
        let (pool, repo) = setup_test_repo().await;
        sqlx::query("INSERT INTO users (id, email) VALUES (9, 'merged@example.com')")
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        let (quiz_id, _) = seed_quiz(&pool, 1).await;

        repo.create(quiz_id, &guest(), 1).await.unwrap();
        repo.create(quiz_id, &guest(), 1).await.unwrap();
        repo.create(quiz_id, &AttemptOwner::User(9), 1).await.unwrap();

        let merged = repo
            .merge_guest("guest_1700000000_test", 9)
            .await
            .expect("Failed to merge");
        assert_eq!(merged, 2);

        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM quiz_attempts WHERE user_id = 9 AND guest_id IS NULL",
        )
        .fetch_one(pool.as_sqlite().unwrap())
        .await
        .unwrap();
        let count: i64 = row.get("count");
        assert_eq!(count, 3);

        // A second merge finds nothing
        assert_eq!(repo.merge_guest("guest_1700000000_test", 9).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_guest_stats() {
        let (pool, repo) = setup_test_repo().await;
        let (quiz_id, _) = seed_quiz(&pool, 1).await;

        for (score, total, completed) in [(8, 10, true), (10, 10, true), (0, 10, false)] {
            sqlx::query(
                "INSERT INTO quiz_attempts (quiz_id, guest_id, score, total_points, is_completed) \
                 VALUES (?, 'guest_stats', ?, ?, ?)",
            )
            .bind(quiz_id)
            .bind(if completed { Some(score) } else { None })
            .bind(total)
            .bind(completed)
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        }

        let stats = repo.guest_stats("guest_stats").await.unwrap();
        assert_eq!(stats.total_quizzes, 3);
        assert_eq!(stats.completed_quizzes, 2);
        assert_eq!(stats.average_score, 90.0);

        let empty = repo.guest_stats("guest_unknown").await.unwrap();
        assert_eq!(empty.total_quizzes, 0);
        assert_eq!(empty.completed_quizzes, 0);
        assert_eq!(empty.average_score, 0.0);
    }

    #[test]
    fn test_guest_stats_rounding_and_zero_points() {
        let stats = compute_guest_stats(&[
            (true, Some(1), 3),
            (true, Some(2), 3),
            (true, Some(0), 0),
            (false, None, 10),
        ]);
        assert_eq!(stats.total_quizzes, 4);
        assert_eq!(stats.completed_quizzes, 3);
        // (33.333 + 66.667 + 0) / 3 = 33.33 after rounding
        assert_eq!(stats.average_score, 33.33);
    }

    #[tokio::test]
    async fn test_cleanup_guest_attempts() {
        let (pool, repo) = setup_test_repo().await;
        sqlx::query("INSERT INTO users (id, email) VALUES (3, 'keeper@example.com')")
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        let (quiz_id, _) = seed_quiz(&pool, 1).await;

        let now = Utc::now();
        let old = now - chrono::Duration::days(40);
        let recent = now - chrono::Duration::days(2);

        let insert = "INSERT INTO quiz_attempts \
             (quiz_id, user_id, guest_id, total_points, is_completed, started_at) \
             VALUES (?, ?, ?, ?, ?, ?)";
        // Stale completed guest attempt
        sqlx::query(insert)
            .bind(quiz_id)
            .bind(None::<i64>)
            .bind(Some("guest_old"))
            .bind(1)
            .bind(true)
            .bind(old)
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        // Stale incomplete guest attempt
        sqlx::query(insert)
            .bind(quiz_id)
            .bind(None::<i64>)
            .bind(Some("guest_old"))
            .bind(1)
            .bind(false)
            .bind(old)
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        // Fresh incomplete guest attempt stays
        sqlx::query(insert)
            .bind(quiz_id)
            .bind(None::<i64>)
            .bind(Some("guest_new"))
            .bind(1)
            .bind(false)
            .bind(recent)
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        // Old user attempt stays
        sqlx::query(insert)
            .bind(quiz_id)
            .bind(Some(3i64))
            .bind(None::<String>)
            .bind(1)
            .bind(true)
            .bind(old)
            .execute(pool.as_sqlite().unwrap())
            .await
            .unwrap();

        let deleted = repo
            .cleanup_guest_attempts(now - chrono::Duration::days(30), now - chrono::Duration::days(7))
            .await
            .expect("Failed to cleanup");
        assert_eq!(deleted, 2);

        let row = sqlx::query("SELECT COUNT(*) AS count FROM quiz_attempts")
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        let count: i64 = row.get("count");
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_get_answers_ordering() {
        let (pool, repo) = setup_test_repo().await;
        let (quiz_id, question_ids) = seed_quiz(&pool, 3).await;
        let attempt = repo.create(quiz_id, &guest(), 3).await.unwrap();

        for &question_id in &question_ids {
            repo.record_answer(attempt.id, question_id, OptionKey::A, true, None)
                .await
                .unwrap();
        }

        let answers = repo.get_answers(attempt.id).await.unwrap();
        assert_eq!(answers.len(), 3);
        let ids: Vec<i64> = answers.iter().map(|a| a.question_id).collect();
        assert_eq!(ids, question_ids);
    }

    #[test]
    fn test_compute_score_edges() {
        assert_eq!(compute_score(0, 0, 10), 0);
        assert_eq!(compute_score(1, 2, 3), 2);
        assert_eq!(compute_score(2, 3, 3), 2);
        assert_eq!(compute_score(3, 3, 3), 3);
        assert_eq!(compute_percentage(1, 0), 0);
        assert_eq!(compute_percentage(1, 3), 33);
        assert_eq!(compute_percentage(2, 3), 67);
    }
}
