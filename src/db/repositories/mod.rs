//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity.

pub mod attempt;
pub mod content;
pub mod hero;
pub mod question;
pub mod quiz;
pub mod session;
pub mod user;

pub use attempt::{AttemptRepository, SqlxAttemptRepository};
pub use content::{ContentRepository, SqlxContentRepository};
pub use hero::{HeroRepository, SqlxHeroRepository};
pub use question::{QuestionRepository, SqlxQuestionRepository};
pub use quiz::{QuizRepository, SqlxQuizRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};
