//! Content catalog models
//!
//! Exams, test series, and notes are the image-card rails on the
//! homepage. Test series optionally link to the exam they prepare for;
//! notes carry the uploading user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Exam card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    /// Unique identifier
    pub id: i64,
    /// Display title
    pub title: String,
    /// Card image URL
    pub image_url: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Test series card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSeries {
    /// Unique identifier
    pub id: i64,
    /// Display title
    pub title: String,
    /// Card image URL
    pub image_url: String,
    /// Exam this series prepares for
    pub exam_id: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Notes card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    /// Unique identifier
    pub id: i64,
    /// Display title
    pub title: String,
    /// Card image URL
    pub image_url: String,
    /// Uploading user
    pub user_id: Option<i64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Input for creating an exam card
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExamInput {
    /// Display title
    pub title: String,
    /// Card image URL
    pub image_url: String,
}

/// Input for creating a test series card
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTestSeriesInput {
    /// Display title
    pub title: String,
    /// Card image URL
    pub image_url: String,
    /// Exam this series prepares for
    pub exam_id: Option<i64>,
}

/// Input for creating a notes card
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNoteInput {
    /// Display title
    pub title: String,
    /// Card image URL
    pub image_url: String,
    /// Uploading user (filled from the session by handlers)
    #[serde(skip)]
    pub user_id: Option<i64>,
}

/// Input for updating any catalog card
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCardInput {
    /// New title
    pub title: Option<String>,
    /// New image URL
    pub image_url: Option<String>,
}
