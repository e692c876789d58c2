//! Question bank models
//!
//! A question is language-neutral metadata (type, category, difficulty)
//! with one translation row per language carrying the actual text, the
//! four options, and which option is correct. Tags are free-form strings
//! used for filtered browsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Language;

/// Question entity: language-neutral part of a bank question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier
    pub id: i64,
    /// Question type (e.g. "mcq")
    pub question_type: String,
    /// Subject category
    pub category: Option<String>,
    /// Difficulty label (e.g. "easy", "medium", "hard")
    pub difficulty: Option<String>,
    /// Whether the question is available for quizzes and listings
    pub is_active: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// One language's rendering of a question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionTranslation {
    /// Unique identifier
    pub id: i64,
    /// Owning question
    pub question_id: i64,
    /// Translation language
    pub language: Language,
    /// Question text
    pub question_text: String,
    /// Explanation shown after answering
    pub explanation: Option<String>,
    /// Option A text
    pub option_a: String,
    /// Option B text
    pub option_b: String,
    /// Option C text
    pub option_c: String,
    /// Option D text
    pub option_d: String,
    /// Which option is correct
    pub correct_option_key: OptionKey,
}

/// Question with its translation for one language and its tags.
///
/// This is the shape listings and quiz payloads carry; the full
/// all-languages form only appears in the admin editor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionWithTranslation {
    /// The question metadata
    #[serde(flatten)]
    pub question: Question,
    /// Translation for the requested language
    pub translation: QuestionTranslation,
    /// Tags on the question
    pub tags: Vec<String>,
}

/// Answer option key (the four multiple-choice slots)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionKey::A => write!(f, "A"),
            OptionKey::B => write!(f, "B"),
            OptionKey::C => write!(f, "C"),
            OptionKey::D => write!(f, "D"),
        }
    }
}

impl FromStr for OptionKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(OptionKey::A),
            "B" => Ok(OptionKey::B),
            "C" => Ok(OptionKey::C),
            "D" => Ok(OptionKey::D),
            _ => Err(anyhow::anyhow!("Invalid option key: {}", s)),
        }
    }
}

/// Input for creating a translation alongside a question
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTranslationInput {
    /// Translation language
    pub language: Language,
    /// Question text
    pub question_text: String,
    /// Explanation shown after answering
    pub explanation: Option<String>,
    /// Option A text
    pub option_a: String,
    /// Option B text
    pub option_b: String,
    /// Option C text
    pub option_c: String,
    /// Option D text
    pub option_d: String,
    /// Which option is correct
    pub correct_option_key: OptionKey,
}

/// Input for creating a question with its first translation and tags
#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionInput {
    /// Question type
    pub question_type: String,
    /// Subject category
    pub category: Option<String>,
    /// Difficulty label
    pub difficulty: Option<String>,
    /// Active flag (defaults to true)
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// First translation
    pub translation: CreateTranslationInput,
}

fn default_active() -> bool {
    true
}

/// Filters for listing questions
#[derive(Debug, Clone, Default)]
pub struct QuestionFilter {
    /// Restrict to a category
    pub category: Option<String>,
    /// Restrict to a difficulty
    pub difficulty: Option<String>,
    /// Match any of these tags
    pub tags: Vec<String>,
    /// Substring match on question text
    pub search: Option<String>,
    /// Language of the translation to return and search
    pub language: Language,
}
