//! Quiz service
//!
//! Business rules for quizzes and quiz attempts:
//! - Quiz CRUD with validation (admin surface)
//! - The attempt state machine: start with a points snapshot, answer with
//!   server-side correctness checks, complete exactly once with scoring
//! - Guest progress: merge into a signed-in user, per-guest statistics,
//!   retention sweep for stale guest attempts

use crate::db::repositories::{AttemptRepository, QuestionRepository, QuizRepository};
use crate::models::{
    AnswerOutcome, AttemptDetail, AttemptOwner, AttemptResults, CompleteOutcome, CreateQuizInput,
    GuestStats, Language, ListParams, OptionKey, PagedResult, Quiz, QuizAttempt, QuizDetail,
    QuizFilter, QuizSummary, QuestionAttempt, UpdateQuizInput,
};
use anyhow::Context;
use chrono::{Duration, Utc};
use std::sync::Arc;

/// Completed guest attempts are kept this many days
const COMPLETED_GUEST_RETENTION_DAYS: i64 = 30;

/// Abandoned (incomplete) guest attempts are kept this many days
const INCOMPLETE_GUEST_RETENTION_DAYS: i64 = 7;

/// Longest accepted client-generated guest id
const MAX_GUEST_ID_LEN: usize = 64;

/// Error types for quiz service operations
#[derive(Debug, thiserror::Error)]
pub enum QuizServiceError {
    /// Quiz, attempt, or question not found
    #[error("{0}")]
    NotFound(String),

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The attempt was already completed; answers and scoring are frozen
    #[error("Quiz attempt is already completed")]
    AlreadyCompleted,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Quiz service for quizzes, attempts, and guest progress
pub struct QuizService {
    quiz_repo: Arc<dyn QuizRepository>,
    question_repo: Arc<dyn QuestionRepository>,
    attempt_repo: Arc<dyn AttemptRepository>,
}

impl QuizService {
    /// Create a new quiz service
    pub fn new(
        quiz_repo: Arc<dyn QuizRepository>,
        question_repo: Arc<dyn QuestionRepository>,
        attempt_repo: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            quiz_repo,
            question_repo,
            attempt_repo,
        }
    }

    // ========================================================================
    // Quiz CRUD
    // ========================================================================

    /// Create a quiz with its ordered question list
    ///
    /// # Errors
    ///
    /// - `ValidationError` if the title is empty, the question list is empty,
    ///   a points value is not positive, or a referenced question is unknown
    /// - `InternalError` for database errors
    pub async fn create_quiz(
        &self,
        input: CreateQuizInput,
        created_by: Option<i64>,
    ) -> Result<Quiz, QuizServiceError> {
        if input.title.trim().is_empty() {
            return Err(QuizServiceError::ValidationError(
                "Quiz title cannot be empty".to_string(),
            ));
        }

        if input.questions.is_empty() {
            return Err(QuizServiceError::ValidationError(
                "Quiz must contain at least one question".to_string(),
            ));
        }

        for question in &input.questions {
            if question.points <= 0 {
                return Err(QuizServiceError::ValidationError(format!(
                    "Points for question {} must be positive",
                    question.question_id
                )));
            }

            let exists = self
                .question_repo
                .get(question.question_id, Language::En)
                .await
                .context("Failed to check question")?
                .is_some();
            if !exists {
                return Err(QuizServiceError::ValidationError(format!(
                    "Question {} does not exist",
                    question.question_id
                )));
            }
        }

        let quiz = self
            .quiz_repo
            .create(&input, created_by)
            .await
            .context("Failed to create quiz")?;

        tracing::info!(quiz_id = quiz.id, title = %quiz.title, "Quiz created");

        Ok(quiz)
    }

    /// Public quiz listing with aggregate counts and creator identity
    pub async fn list_quizzes(
        &self,
        filter: &QuizFilter,
        params: &ListParams,
    ) -> Result<PagedResult<QuizSummary>, QuizServiceError> {
        let result = self
            .quiz_repo
            .list(filter, params)
            .await
            .context("Failed to list quizzes")?;

        Ok(result)
    }

    /// Quiz detail with ordered questions for one language
    pub async fn get_quiz_detail(
        &self,
        id: i64,
        language: Language,
    ) -> Result<QuizDetail, QuizServiceError> {
        self.quiz_repo
            .get_detail(id, language)
            .await
            .context("Failed to get quiz")?
            .ok_or_else(|| QuizServiceError::NotFound(format!("Quiz not found: {}", id)))
    }

    /// Update quiz metadata; absent fields keep their values
    pub async fn update_quiz(
        &self,
        id: i64,
        input: &UpdateQuizInput,
    ) -> Result<Quiz, QuizServiceError> {
        if let Some(title) = &input.title {
            if title.trim().is_empty() {
                return Err(QuizServiceError::ValidationError(
                    "Quiz title cannot be empty".to_string(),
                ));
            }
        }

        self.quiz_repo
            .update(id, input)
            .await
            .context("Failed to update quiz")?
            .ok_or_else(|| QuizServiceError::NotFound(format!("Quiz not found: {}", id)))
    }

    /// Delete a quiz and its question links
    pub async fn delete_quiz(&self, id: i64) -> Result<(), QuizServiceError> {
        let deleted = self
            .quiz_repo
            .delete(id)
            .await
            .context("Failed to delete quiz")?;

        if !deleted {
            return Err(QuizServiceError::NotFound(format!("Quiz not found: {}", id)));
        }

        tracing::info!(quiz_id = id, "Quiz deleted");

        Ok(())
    }

    // ========================================================================
    // Attempt state machine
    // ========================================================================

    /// Start an attempt against an active quiz
    ///
    /// Snapshots the quiz's total points so later edits do not disturb
    /// in-flight scoring, and returns the attempt together with the quiz's
    /// ordered questions so the taker can render immediately.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the quiz does not exist or is inactive
    /// - `ValidationError` for a malformed guest id
    pub async fn start_attempt(
        &self,
        quiz_id: i64,
        owner: AttemptOwner,
        language: Language,
    ) -> Result<AttemptDetail, QuizServiceError> {
        if let AttemptOwner::Guest(guest_id) = &owner {
            validate_guest_id(guest_id)?;
        }

        let quiz = self
            .quiz_repo
            .get(quiz_id)
            .await
            .context("Failed to get quiz")?;
        let quiz = match quiz {
            Some(q) if q.is_active => q,
            _ => {
                return Err(QuizServiceError::NotFound(
                    "Quiz not found or inactive".to_string(),
                ))
            }
        };

        let total_points = self
            .quiz_repo
            .total_points(quiz.id)
            .await
            .context("Failed to sum quiz points")?;

        let attempt = self
            .attempt_repo
            .create(quiz.id, &owner, total_points)
            .await
            .context("Failed to create attempt")?;

        let detail = self
            .quiz_repo
            .get_detail(quiz.id, language)
            .await
            .context("Failed to load quiz questions")?
            .ok_or_else(|| QuizServiceError::NotFound(format!("Quiz not found: {}", quiz.id)))?;

        tracing::info!(
            attempt_id = attempt.id,
            quiz_id = quiz.id,
            guest = attempt.guest_id.is_some(),
            "Quiz attempt started"
        );

        Ok(AttemptDetail {
            attempt,
            quiz: detail,
            answers: Vec::new(),
        })
    }

    /// Attempt detail: the attempt, its quiz, and the answers recorded so far
    pub async fn get_attempt(
        &self,
        attempt_id: i64,
        language: Language,
    ) -> Result<AttemptDetail, QuizServiceError> {
        let attempt = self
            .attempt_repo
            .get(attempt_id)
            .await
            .context("Failed to get attempt")?
            .ok_or_else(|| {
                QuizServiceError::NotFound(format!("Attempt not found: {}", attempt_id))
            })?;

        let quiz = self
            .quiz_repo
            .get_detail(attempt.quiz_id, language)
            .await
            .context("Failed to get quiz")?
            .ok_or_else(|| {
                QuizServiceError::NotFound(format!("Quiz not found: {}", attempt.quiz_id))
            })?;

        let answers = self
            .attempt_repo
            .get_answers(attempt_id)
            .await
            .context("Failed to get answers")?;

        Ok(AttemptDetail {
            attempt,
            quiz,
            answers,
        })
    }

    /// Submit or replace an answer on an open attempt
    ///
    /// Correctness is judged server-side against the question's translation
    /// for the requested language; the client never learns the correct key
    /// ahead of completion.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the attempt or question does not exist
    /// - `AlreadyCompleted` if the attempt has been completed
    pub async fn submit_answer(
        &self,
        attempt_id: i64,
        question_id: i64,
        selected_option: OptionKey,
        time_spent: Option<i64>,
        language: Language,
    ) -> Result<QuestionAttempt, QuizServiceError> {
        let question = self
            .question_repo
            .get(question_id, language)
            .await
            .context("Failed to get question")?
            .ok_or_else(|| {
                QuizServiceError::NotFound(format!("Question not found: {}", question_id))
            })?;

        let is_correct = question.translation.correct_option_key == selected_option;

        let outcome = self
            .attempt_repo
            .record_answer(attempt_id, question_id, selected_option, is_correct, time_spent)
            .await
            .context("Failed to record answer")?;

        match outcome {
            AnswerOutcome::Recorded(answer) => Ok(answer),
            AnswerOutcome::AttemptNotFound => Err(QuizServiceError::NotFound(format!(
                "Attempt not found: {}",
                attempt_id
            ))),
            AnswerOutcome::AlreadyCompleted => Err(QuizServiceError::AlreadyCompleted),
        }
    }

    /// Complete and score an attempt
    ///
    /// # Errors
    ///
    /// - `NotFound` if the attempt does not exist
    /// - `AlreadyCompleted` if it was completed before (also under racing
    ///   completions; the guarded update admits exactly one winner)
    pub async fn complete_attempt(
        &self,
        attempt_id: i64,
    ) -> Result<(QuizAttempt, AttemptResults), QuizServiceError> {
        let outcome = self
            .attempt_repo
            .complete(attempt_id)
            .await
            .context("Failed to complete attempt")?;

        match outcome {
            CompleteOutcome::Completed { attempt, results } => {
                tracing::info!(
                    attempt_id = attempt.id,
                    score = results.score,
                    total_points = results.total_points,
                    "Quiz attempt completed"
                );
                Ok((attempt, results))
            }
            CompleteOutcome::AttemptNotFound => Err(QuizServiceError::NotFound(format!(
                "Attempt not found: {}",
                attempt_id
            ))),
            CompleteOutcome::AlreadyCompleted => Err(QuizServiceError::AlreadyCompleted),
        }
    }

    // ========================================================================
    // Guest progress
    // ========================================================================

    /// Move all of a guest's unowned attempts to a signed-in user
    ///
    /// Returns how many attempts moved; zero means there was nothing to
    /// merge, which is not an error.
    pub async fn merge_guest_progress(
        &self,
        guest_id: &str,
        user_id: i64,
    ) -> Result<i64, QuizServiceError> {
        validate_guest_id(guest_id)?;

        let merged = self
            .attempt_repo
            .merge_guest(guest_id, user_id)
            .await
            .context("Failed to merge guest attempts")?;

        if merged > 0 {
            tracing::info!(user_id, merged, "Merged guest progress into user account");
        }

        Ok(merged)
    }

    /// Aggregate statistics for one guest id
    pub async fn guest_stats(&self, guest_id: &str) -> Result<GuestStats, QuizServiceError> {
        validate_guest_id(guest_id)?;

        let stats = self
            .attempt_repo
            .guest_stats(guest_id)
            .await
            .context("Failed to compute guest stats")?;

        Ok(stats)
    }

    /// Delete guest attempts past their retention window
    ///
    /// Completed attempts are kept 30 days, abandoned ones 7. Called by the
    /// background sweep alongside expired-session cleanup.
    ///
    /// # Returns
    ///
    /// The number of attempts deleted
    pub async fn cleanup_stale_guest_attempts(&self) -> Result<u64, QuizServiceError> {
        let now = Utc::now();
        let deleted = self
            .attempt_repo
            .cleanup_guest_attempts(
                now - Duration::days(COMPLETED_GUEST_RETENTION_DAYS),
                now - Duration::days(INCOMPLETE_GUEST_RETENTION_DAYS),
            )
            .await
            .context("Failed to delete stale guest attempts")?;

        if deleted > 0 {
            tracing::info!(deleted, "Swept stale guest attempts");
        }

        Ok(deleted)
    }

}

/// Check a client-generated guest id: non-empty, bounded length
fn validate_guest_id(guest_id: &str) -> Result<(), QuizServiceError> {
    if guest_id.trim().is_empty() {
        return Err(QuizServiceError::ValidationError(
            "Guest id cannot be empty".to_string(),
        ));
    }

    if guest_id.len() > MAX_GUEST_ID_LEN {
        return Err(QuizServiceError::ValidationError(format!(
            "Guest id exceeds {} characters",
            MAX_GUEST_ID_LEN
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxAttemptRepository, SqlxQuestionRepository, SqlxQuizRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{CreateQuestionInput, CreateTranslationInput, QuizQuestionInput};

    async fn setup_test_service() -> (DynDatabasePool, QuizService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = QuizService::new(
            SqlxQuizRepository::boxed(pool.clone()),
            SqlxQuestionRepository::boxed(pool.clone()),
            SqlxAttemptRepository::boxed(pool.clone()),
        );

        (pool, service)
    }

    /// Create `count` one-point questions with option A correct
    async fn seed_questions(pool: &DynDatabasePool, count: usize) -> Vec<i64> {
        let questions = SqlxQuestionRepository::new(pool.clone());
        let mut ids = Vec::new();
        for i in 0..count {
            let created = questions
                .create(
                    &CreateQuestionInput {
                        question_type: "mcq".to_string(),
                        category: Some("polity".to_string()),
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
                    },
                    None,
                )
                .await
                .expect("Failed to create question");
            ids.push(created.question.id);
        }
        ids
    }

    fn quiz_input(title: &str, question_ids: &[i64]) -> CreateQuizInput {
        CreateQuizInput {
            title: title.to_string(),
            description: None,
            quiz_type: Some("practice".to_string()),
            category: Some("polity".to_string()),
            time_limit: Some(600),
            is_active: true,
            is_public: true,
            questions: question_ids
                .iter()
                .map(|&question_id| QuizQuestionInput {
                    question_id,
                    points: 1,
                })
                .collect(),
        }
    }

    fn guest() -> AttemptOwner {
        AttemptOwner::Guest("guest_1700000000_svc".to_string())
    }

    // ========================================================================
    // Quiz CRUD tests
    // ========================================================================

    #[tokio::test]
    async fn test_create_quiz() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 2).await;

        let quiz = service
            .create_quiz(quiz_input("Polity Mock 1", &question_ids), Some(1))
            .await
            .expect("Failed to create quiz");

        assert!(quiz.id > 0);
        assert_eq!(quiz.title, "Polity Mock 1");

        let detail = service
            .get_quiz_detail(quiz.id, Language::En)
            .await
            .expect("Failed to get detail");
        assert_eq!(detail.questions.len(), 2);
        assert_eq!(detail.questions[0].order, 1);
    }

    #[tokio::test]
    async fn test_create_quiz_empty_title_fails() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 1).await;

        let result = service
            .create_quiz(quiz_input("   ", &question_ids), None)
            .await;

        assert!(matches!(result, Err(QuizServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_quiz_without_questions_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service.create_quiz(quiz_input("Empty", &[]), None).await;

        assert!(matches!(result, Err(QuizServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_quiz_unknown_question_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service
            .create_quiz(quiz_input("Ghost questions", &[9999]), None)
            .await;

        assert!(matches!(result, Err(QuizServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_create_quiz_non_positive_points_fails() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 1).await;

        let mut input = quiz_input("Zero points", &question_ids);
        input.questions[0].points = 0;

        let result = service.create_quiz(input, None).await;

        assert!(matches!(result, Err(QuizServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_update_quiz_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service.update_quiz(9999, &UpdateQuizInput::default()).await;

        assert!(matches!(result, Err(QuizServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_quiz() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 1).await;
        let quiz = service
            .create_quiz(quiz_input("To delete", &question_ids), None)
            .await
            .expect("Failed to create quiz");

        service
            .delete_quiz(quiz.id)
            .await
            .expect("Failed to delete quiz");

        let result = service.delete_quiz(quiz.id).await;
        assert!(matches!(result, Err(QuizServiceError::NotFound(_))));
    }

    // ========================================================================
    // Attempt flow tests
    // ========================================================================

    #[tokio::test]
    async fn test_start_attempt_snapshots_points() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 3).await;
        let quiz = service
            .create_quiz(quiz_input("Snapshot", &question_ids), None)
            .await
            .expect("Failed to create quiz");

        let detail = service
            .start_attempt(quiz.id, guest(), Language::En)
            .await
            .expect("Failed to start attempt");

        assert_eq!(detail.attempt.total_points, 3);
        assert!(!detail.attempt.is_completed);
        assert_eq!(detail.quiz.questions.len(), 3);
        assert!(detail.answers.is_empty());
    }

    #[tokio::test]
    async fn test_start_attempt_inactive_quiz_fails() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 1).await;
        let mut input = quiz_input("Inactive", &question_ids);
        input.is_active = false;
        let quiz = service
            .create_quiz(input, None)
            .await
            .expect("Failed to create quiz");

        let result = service.start_attempt(quiz.id, guest(), Language::En).await;

        assert!(matches!(result, Err(QuizServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_start_attempt_unknown_quiz_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service.start_attempt(9999, guest(), Language::En).await;

        assert!(matches!(result, Err(QuizServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_start_attempt_bad_guest_id_fails() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 1).await;
        let quiz = service
            .create_quiz(quiz_input("Guests", &question_ids), None)
            .await
            .expect("Failed to create quiz");

        let empty = service
            .start_attempt(quiz.id, AttemptOwner::Guest("  ".to_string()), Language::En)
            .await;
        assert!(matches!(empty, Err(QuizServiceError::ValidationError(_))));

        let oversized = service
            .start_attempt(
                quiz.id,
                AttemptOwner::Guest("g".repeat(MAX_GUEST_ID_LEN + 1)),
                Language::En,
            )
            .await;
        assert!(matches!(
            oversized,
            Err(QuizServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_submit_answer_judges_correctness() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 2).await;
        let quiz = service
            .create_quiz(quiz_input("Judging", &question_ids), None)
            .await
            .expect("Failed to create quiz");
        let detail = service
            .start_attempt(quiz.id, guest(), Language::En)
            .await
            .expect("Failed to start attempt");

        let right = service
            .submit_answer(
                detail.attempt.id,
                question_ids[0],
                OptionKey::A,
                Some(12),
                Language::En,
            )
            .await
            .expect("Failed to submit answer");
        assert_eq!(right.is_correct, Some(true));
        assert_eq!(right.time_spent, Some(12));

        let wrong = service
            .submit_answer(
                detail.attempt.id,
                question_ids[1],
                OptionKey::C,
                None,
                Language::En,
            )
            .await
            .expect("Failed to submit answer");
        assert_eq!(wrong.is_correct, Some(false));
    }

    #[tokio::test]
    async fn test_submit_answer_unknown_question_fails() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 1).await;
        let quiz = service
            .create_quiz(quiz_input("Unknown question", &question_ids), None)
            .await
            .expect("Failed to create quiz");
        let detail = service
            .start_attempt(quiz.id, guest(), Language::En)
            .await
            .expect("Failed to start attempt");

        let result = service
            .submit_answer(detail.attempt.id, 9999, OptionKey::A, None, Language::En)
            .await;

        assert!(matches!(result, Err(QuizServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_complete_scores_and_rejects_repeat() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 2).await;
        let quiz = service
            .create_quiz(quiz_input("Scoring", &question_ids), None)
            .await
            .expect("Failed to create quiz");
        let detail = service
            .start_attempt(quiz.id, guest(), Language::En)
            .await
            .expect("Failed to start attempt");

        service
            .submit_answer(
                detail.attempt.id,
                question_ids[0],
                OptionKey::A,
                None,
                Language::En,
            )
            .await
            .expect("Failed to submit answer");
        service
            .submit_answer(
                detail.attempt.id,
                question_ids[1],
                OptionKey::B,
                None,
                Language::En,
            )
            .await
            .expect("Failed to submit answer");

        let (attempt, results) = service
            .complete_attempt(detail.attempt.id)
            .await
            .expect("Failed to complete attempt");

        assert!(attempt.is_completed);
        assert_eq!(results.score, 1);
        assert_eq!(results.total_points, 2);
        assert_eq!(results.percentage, 50);
        assert_eq!(results.correct_answers, 1);
        assert_eq!(results.total_questions, 2);

        let again = service.complete_attempt(detail.attempt.id).await;
        assert!(matches!(again, Err(QuizServiceError::AlreadyCompleted)));
    }

    #[tokio::test]
    async fn test_answer_after_complete_conflicts() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 1).await;
        let quiz = service
            .create_quiz(quiz_input("Frozen", &question_ids), None)
            .await
            .expect("Failed to create quiz");
        let detail = service
            .start_attempt(quiz.id, guest(), Language::En)
            .await
            .expect("Failed to start attempt");
        service
            .complete_attempt(detail.attempt.id)
            .await
            .expect("Failed to complete attempt");

        let result = service
            .submit_answer(
                detail.attempt.id,
                question_ids[0],
                OptionKey::A,
                None,
                Language::En,
            )
            .await;

        assert!(matches!(result, Err(QuizServiceError::AlreadyCompleted)));
    }

    #[tokio::test]
    async fn test_get_attempt_with_answers() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 2).await;
        let quiz = service
            .create_quiz(quiz_input("Detail", &question_ids), None)
            .await
            .expect("Failed to create quiz");
        let started = service
            .start_attempt(quiz.id, guest(), Language::En)
            .await
            .expect("Failed to start attempt");
        service
            .submit_answer(
                started.attempt.id,
                question_ids[0],
                OptionKey::D,
                Some(9),
                Language::En,
            )
            .await
            .expect("Failed to submit answer");

        let detail = service
            .get_attempt(started.attempt.id, Language::En)
            .await
            .expect("Failed to get attempt");

        assert_eq!(detail.attempt.id, started.attempt.id);
        assert_eq!(detail.quiz.questions.len(), 2);
        assert_eq!(detail.answers.len(), 1);
        assert_eq!(detail.answers[0].question_id, question_ids[0]);
    }

    #[tokio::test]
    async fn test_get_attempt_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service.get_attempt(9999, Language::En).await;

        assert!(matches!(result, Err(QuizServiceError::NotFound(_))));
    }

    // ========================================================================
    // Guest progress tests
    // ========================================================================

    #[tokio::test]
    async fn test_merge_guest_progress() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 1).await;
        let quiz = service
            .create_quiz(quiz_input("Merge", &question_ids), None)
            .await
            .expect("Failed to create quiz");

        // A user row for the merge target
        sqlx::query(
            "INSERT INTO users (id, email, role, created_at, updated_at) \
             VALUES (7, 'owner@example.com', 'USER', datetime('now'), datetime('now'))",
        )
        .execute(pool.as_sqlite().unwrap())
        .await
        .expect("Failed to insert user");

        service
            .start_attempt(quiz.id, guest(), Language::En)
            .await
            .expect("Failed to start attempt");
        service
            .start_attempt(quiz.id, guest(), Language::En)
            .await
            .expect("Failed to start attempt");

        let merged = service
            .merge_guest_progress("guest_1700000000_svc", 7)
            .await
            .expect("Failed to merge");
        assert_eq!(merged, 2);

        // Idempotent: nothing left to move
        let again = service
            .merge_guest_progress("guest_1700000000_svc", 7)
            .await
            .expect("Failed to merge");
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_merge_validates_guest_id() {
        let (_pool, service) = setup_test_service().await;

        let result = service.merge_guest_progress("", 1).await;

        assert!(matches!(result, Err(QuizServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_guest_stats_through_service() {
        let (pool, service) = setup_test_service().await;
        let question_ids = seed_questions(&pool, 1).await;
        let quiz = service
            .create_quiz(quiz_input("Stats", &question_ids), None)
            .await
            .expect("Failed to create quiz");

        let detail = service
            .start_attempt(quiz.id, guest(), Language::En)
            .await
            .expect("Failed to start attempt");
        service
            .submit_answer(
                detail.attempt.id,
                question_ids[0],
                OptionKey::A,
                None,
                Language::En,
            )
            .await
            .expect("Failed to submit answer");
        service
            .complete_attempt(detail.attempt.id)
            .await
            .expect("Failed to complete attempt");

        let stats = service
            .guest_stats("guest_1700000000_svc")
            .await
            .expect("Failed to get stats");

        assert_eq!(stats.total_quizzes, 1);
        assert_eq!(stats.completed_quizzes, 1);
        assert!((stats.average_score - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_cleanup_on_empty_database() {
        let (_pool, service) = setup_test_service().await;

        let deleted = service
            .cleanup_stale_guest_attempts()
            .await
            .expect("Failed to sweep");

        assert_eq!(deleted, 0);
    }
}

// ============================================================================
// Property-based tests
// ============================================================================
