//! Quiz attempt models
//!
//! An attempt records one run through a quiz by either a signed-in user
//! (`user_id`) or a guest (`guest_id`); exactly one of the two is set
//! when the attempt starts. Merging guest progress moves ownership to
//! the user and clears the guest id. `total_points` is snapshotted at
//! start so later quiz edits do not change in-flight scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OptionKey, QuizDetail};

/// One run through a quiz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAttempt {
    /// Unique identifier
    pub id: i64,
    /// The quiz being attempted
    pub quiz_id: i64,
    /// Owning user (None for guest attempts)
    pub user_id: Option<i64>,
    /// Owning guest (None for user attempts and merged attempts)
    pub guest_id: Option<String>,
    /// Final score (None until completed)
    pub score: Option<i64>,
    /// Maximum achievable points, snapshotted at start
    pub total_points: i64,
    /// Wall-clock duration in seconds (None until completed)
    pub time_taken: Option<i64>,
    /// Start timestamp
    pub started_at: DateTime<Utc>,
    /// Completion timestamp
    pub completed_at: Option<DateTime<Utc>>,
    /// Whether the attempt has been completed
    pub is_completed: bool,
}

/// One answered question within an attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionAttempt {
    /// Unique identifier
    pub id: i64,
    /// Owning attempt
    pub quiz_attempt_id: i64,
    /// The question answered
    pub question_id: i64,
    /// The chosen option
    pub selected_option: Option<OptionKey>,
    /// Whether the chosen option was correct
    pub is_correct: Option<bool>,
    /// Seconds spent on this question as reported by the client
    pub time_spent: Option<i64>,
    /// When the answer was recorded
    pub answered_at: DateTime<Utc>,
}

/// Scoring summary returned on completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptResults {
    /// Points earned
    pub score: i64,
    /// Maximum achievable points
    pub total_points: i64,
    /// Score as a whole percentage of total points
    pub percentage: i64,
    /// Wall-clock duration in seconds
    pub time_taken: i64,
    /// Number of correctly answered questions
    pub correct_answers: i64,
    /// Number of questions answered
    pub total_questions: i64,
}

/// Aggregate statistics for one guest id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestStats {
    /// Attempts started
    pub total_quizzes: i64,
    /// Attempts completed
    pub completed_quizzes: i64,
    /// Mean score percentage over completed attempts, 2 decimal places
    pub average_score: f64,
}

/// Full attempt payload: the attempt row, its quiz with ordered questions,
/// and the answers recorded so far
#[derive(Debug, Clone, Serialize)]
pub struct AttemptDetail {
    /// The attempt
    #[serde(flatten)]
    pub attempt: QuizAttempt,
    /// The quiz being attempted, with ordered translated questions
    pub quiz: QuizDetail,
    /// Recorded answers, oldest first
    pub answers: Vec<QuestionAttempt>,
}

/// Outcome of recording an answer against an attempt
#[derive(Debug, Clone)]
pub enum AnswerOutcome {
    /// The answer was inserted or replaced
    Recorded(QuestionAttempt),
    /// No attempt with that id exists
    AttemptNotFound,
    /// The attempt was already completed; answers are frozen
    AlreadyCompleted,
}

/// Outcome of completing an attempt
#[derive(Debug, Clone)]
pub enum CompleteOutcome {
    /// The attempt was scored and closed
    Completed {
        /// The attempt with score and timing filled in
        attempt: QuizAttempt,
        /// Scoring summary
        results: AttemptResults,
    },
    /// No attempt with that id exists
    AttemptNotFound,
    /// The attempt was already completed
    AlreadyCompleted,
}

/// Who owns a new attempt
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOwner {
    /// A signed-in user
    User(i64),
    /// A guest, identified by a client-generated id
    Guest(String),
}

impl AttemptOwner {
    /// The user id when owned by a user
    pub fn user_id(&self) -> Option<i64> {
        match self {
            AttemptOwner::User(id) => Some(*id),
            AttemptOwner::Guest(_) => None,
        }
    }

    /// The guest id when owned by a guest
    pub fn guest_id(&self) -> Option<&str> {
        match self {
            AttemptOwner::User(_) => None,
            AttemptOwner::Guest(id) => Some(id.as_str()),
        }
    }
}
