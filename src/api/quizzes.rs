//! Quiz API endpoints
//!
//! Handles HTTP requests for quiz management:
//! - GET /api/quizzes - Public listing with aggregate counts
//! - GET /api/quizzes/{id} - Quiz detail with ordered questions
//! - POST /api/quizzes - Create new quiz (admin)
//! - PUT /api/quizzes/{id} - Update quiz metadata (admin)
//! - DELETE /api/quizzes/{id} - Delete quiz (admin)

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{default_limit, default_page, LanguageQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    CreateQuizInput, ListParams, PagedResult, Quiz, QuizDetail, QuizFilter, QuizSummary,
    UpdateQuizInput,
};
use crate::services::quiz::QuizServiceError;

/// Query parameters for listing quizzes
#[derive(Debug, Deserialize)]
pub struct ListQuizzesQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Filter by quiz type (e.g. "mock-test", "practice")
    #[serde(rename = "type")]
    pub quiz_type: Option<String>,
    pub category: Option<String>,
}

/// Response for quiz list
#[derive(Debug, Serialize)]
pub struct QuizListResponse {
    pub quizzes: Vec<QuizSummary>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: i64,
}

impl From<PagedResult<QuizSummary>> for QuizListResponse {
    fn from(result: PagedResult<QuizSummary>) -> Self {
        let pages = result.pages();
        Self {
            quizzes: result.items,
            total: result.total,
            page: result.page,
            limit: result.limit,
            pages,
        }
    }
}

/// GET /api/quizzes - List public active quizzes, newest first
pub async fn list_quizzes(
    State(state): State<AppState>,
    Query(query): Query<ListQuizzesQuery>,
) -> Result<Json<QuizListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.limit);
    let filter = QuizFilter {
        quiz_type: query.quiz_type,
        category: query.category,
    };

    let result = state
        .quiz_service
        .list_quizzes(&filter, &params)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(result.into()))
}

/// GET /api/quizzes/{id} - Quiz detail with ordered questions
pub async fn get_quiz(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<QuizDetail>, ApiError> {
    let detail = state
        .quiz_service
        .get_quiz_detail(id, query.language)
        .await
        .map_err(|e| match e {
            QuizServiceError::NotFound(msg) => ApiError::not_found(msg),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    Ok(Json(detail))
}

/// POST /api/quizzes - Create a quiz with its question list
///
/// Requires admin.
pub async fn create_quiz(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateQuizInput>,
) -> Result<(StatusCode, Json<Quiz>), ApiError> {
    let quiz = state
        .quiz_service
        .create_quiz(body, Some(user.0.id))
        .await
        .map_err(|e| match e {
            QuizServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(quiz)))
}

/// PUT /api/quizzes/{id} - Update quiz metadata
///
/// Requires admin. Absent fields keep their values.
pub async fn update_quiz(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateQuizInput>,
) -> Result<Json<Quiz>, ApiError> {
    let quiz = state
        .quiz_service
        .update_quiz(id, &body)
        .await
        .map_err(|e| match e {
            QuizServiceError::NotFound(msg) => ApiError::not_found(msg),
            QuizServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    Ok(Json(quiz))
}

/// DELETE /api/quizzes/{id} - Delete a quiz and its question links
///
/// Requires admin. Past attempts keep their snapshot scores.
pub async fn delete_quiz(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.quiz_service.delete_quiz(id).await.map_err(|e| match e {
        QuizServiceError::NotFound(msg) => ApiError::not_found(msg),
        _ => ApiError::internal_error(e.to_string()),
    })?;

    Ok(StatusCode::NO_CONTENT)
}
