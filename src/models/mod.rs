//! Data models
//!
//! This module contains all data structures used throughout the Pariksha platform.
//! Models represent:
//! - Database entities (User, Session, Question, Quiz, QuizAttempt, Exam, TestSeries, Note, HeroSection)
//! - API request/response types
//! - Internal data transfer objects

mod attempt;
mod content;
mod hero;
mod paging;
mod question;
mod quiz;
mod session;
mod user;

pub use attempt::{
    AnswerOutcome, AttemptDetail, AttemptOwner, AttemptResults, CompleteOutcome, GuestStats,
    QuestionAttempt, QuizAttempt,
};
pub use content::{CreateExamInput, CreateNoteInput, CreateTestSeriesInput, Exam, Note, TestSeries, UpdateCardInput};
pub use hero::HeroSection;
pub use paging::{ListParams, PagedResult};
pub use question::{CreateQuestionInput, CreateTranslationInput, OptionKey, Question, QuestionFilter, QuestionTranslation, QuestionWithTranslation};
pub use quiz::{CreateQuizInput, Quiz, QuizDetail, QuizFilter, QuizQuestion, QuizQuestionDetail, QuizQuestionInput, QuizSummary, UpdateQuizInput};
pub use session::Session;
pub use user::{CreateUserInput, Language, User, UserRole};
