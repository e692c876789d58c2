//! Quiz models
//!
//! A quiz is an ordered set of bank questions with per-question points.
//! Listings carry aggregate counts; the detail shape carries the full
//! ordered questions with translations for one language.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::QuestionWithTranslation;

/// Quiz entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    /// Unique identifier
    pub id: i64,
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Kind of quiz (e.g. "mock-test", "practice")
    pub quiz_type: Option<String>,
    /// Subject category
    pub category: Option<String>,
    /// Time limit in seconds (None = untimed)
    pub time_limit: Option<i64>,
    /// Whether attempts may be started
    pub is_active: bool,
    /// Whether the quiz appears in public listings
    pub is_public: bool,
    /// Creating admin
    pub created_by: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Membership of a question in a quiz
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Unique identifier
    pub id: i64,
    /// Owning quiz
    pub quiz_id: i64,
    /// Bank question
    pub question_id: i64,
    /// Position within the quiz (1-based)
    pub order: i64,
    /// Points awarded for a correct answer
    pub points: i64,
}

/// Listing row: quiz plus aggregate counts and creator identity
#[derive(Debug, Clone, Serialize)]
pub struct QuizSummary {
    /// The quiz
    #[serde(flatten)]
    pub quiz: Quiz,
    /// Number of questions in the quiz
    pub question_count: i64,
    /// Number of attempts ever started
    pub attempt_count: i64,
    /// Creator display name
    pub creator_name: Option<String>,
    /// Creator email
    pub creator_email: Option<String>,
}

/// Detail shape: quiz with its ordered questions for one language
#[derive(Debug, Clone, Serialize)]
pub struct QuizDetail {
    /// The quiz
    #[serde(flatten)]
    pub quiz: Quiz,
    /// Ordered questions with translations
    pub questions: Vec<QuizQuestionDetail>,
}

/// One ordered slot of a quiz detail
#[derive(Debug, Clone, Serialize)]
pub struct QuizQuestionDetail {
    /// Position within the quiz (1-based)
    pub order: i64,
    /// Points awarded for a correct answer
    pub points: i64,
    /// The question with its translation and tags
    pub question: QuestionWithTranslation,
}

/// One question reference when creating a quiz
#[derive(Debug, Clone, Deserialize)]
pub struct QuizQuestionInput {
    /// Bank question id
    pub question_id: i64,
    /// Points (defaults to 1)
    #[serde(default = "default_points")]
    pub points: i64,
}

fn default_points() -> i64 {
    1
}

/// Input for creating a quiz with its question list.
///
/// Question order is the position in `questions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuizInput {
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Kind of quiz
    #[serde(rename = "type")]
    pub quiz_type: Option<String>,
    /// Subject category
    pub category: Option<String>,
    /// Time limit in seconds
    pub time_limit: Option<i64>,
    /// Active flag (defaults to true)
    #[serde(default = "default_flag")]
    pub is_active: bool,
    /// Public flag (defaults to true)
    #[serde(default = "default_flag")]
    pub is_public: bool,
    /// Ordered question list
    pub questions: Vec<QuizQuestionInput>,
}

fn default_flag() -> bool {
    true
}

/// Input for updating quiz metadata
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateQuizInput {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New kind
    #[serde(rename = "type")]
    pub quiz_type: Option<String>,
    /// New category
    pub category: Option<String>,
    /// New time limit in seconds
    pub time_limit: Option<i64>,
    /// New active flag
    pub is_active: Option<bool>,
    /// New public flag
    pub is_public: Option<bool>,
}

/// Filters for the public quiz listing
#[derive(Debug, Clone, Default)]
pub struct QuizFilter {
    /// Restrict to a quiz type
    pub quiz_type: Option<String>,
    /// Restrict to a category
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_quiz_input_defaults() {
        let json = r#"{
            "title": "UPSC Prelims Mock 1",
            "type": "mock-test",
            "questions": [
                {"question_id": 4},
                {"question_id": 9, "points": 2}
            ]
        }"#;
        let input: CreateQuizInput = serde_json::from_str(json).unwrap();
        assert!(input.is_active);
        assert!(input.is_public);
        assert_eq!(input.quiz_type.as_deref(), Some("mock-test"));
        assert_eq!(input.questions.len(), 2);
        assert_eq!(input.questions[0].points, 1);
        assert_eq!(input.questions[1].points, 2);
    }

    #[test]
    fn test_update_quiz_input_partial() {
        let input: UpdateQuizInput = serde_json::from_str(r#"{"is_active": false}"#).unwrap();
        assert_eq!(input.is_active, Some(false));
        assert!(input.title.is_none());
        assert!(input.time_limit.is_none());
    }
}
