//! Services layer - Business logic
//!
//! This module contains all business logic services for Pariksha Hub.
//! Services are responsible for:
//! - Implementing business rules
//! - Coordinating between repositories, cache, and external providers
//! - Handling validation and error cases

pub mod content;
pub mod oauth;
pub mod question;
pub mod quiz;
pub mod user;

pub use content::{ContentService, ContentServiceError, HomePayload, ImageUpload};
pub use oauth::{GoogleOAuthClient, GoogleProfile, OAuthError};
pub use question::{BulkImportReport, QuestionService, QuestionServiceError};
pub use quiz::{QuizService, QuizServiceError};
pub use user::{UserService, UserServiceError};
