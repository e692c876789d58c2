//! Question bank API endpoints
//!
//! Handles HTTP requests for the question bank:
//! - GET /api/questions - List questions with filtering
//! - POST /api/questions - Create new question (admin)
//! - POST /api/questions/bulk-upload - CSV import (admin)

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{default_limit, default_page};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    CreateQuestionInput, Language, ListParams, PagedResult, QuestionFilter,
    QuestionWithTranslation,
};
use crate::services::question::{BulkImportReport, QuestionServiceError};

/// Query parameters for listing questions
#[derive(Debug, Deserialize)]
pub struct ListQuestionsQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    /// Comma-separated tag list; rows matching any tag are returned
    pub tags: Option<String>,
    /// Substring match on question text
    pub search: Option<String>,
    #[serde(default)]
    pub language: Language,
}

/// Response for question list
#[derive(Debug, Serialize)]
pub struct QuestionListResponse {
    pub questions: Vec<QuestionWithTranslation>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub pages: i64,
}

impl From<PagedResult<QuestionWithTranslation>> for QuestionListResponse {
    fn from(result: PagedResult<QuestionWithTranslation>) -> Self {
        let pages = result.pages();
        Self {
            questions: result.items,
            total: result.total,
            page: result.page,
            limit: result.limit,
            pages,
        }
    }
}

/// GET /api/questions - List active questions, newest first
pub async fn list_questions(
    State(state): State<AppState>,
    Query(query): Query<ListQuestionsQuery>,
) -> Result<Json<QuestionListResponse>, ApiError> {
    let params = ListParams::new(query.page, query.limit);

    let tags = query
        .tags
        .as_deref()
        .map(|s| {
            s.split(',')
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .collect()
        })
        .unwrap_or_default();

    let filter = QuestionFilter {
        category: query.category,
        difficulty: query.difficulty,
        tags,
        search: query.search,
        language: query.language,
    };

    let result = state
        .question_service
        .list_questions(&filter, &params)
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    Ok(Json(result.into()))
}

/// POST /api/questions - Create a question with its first translation
///
/// Requires admin.
pub async fn create_question(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateQuestionInput>,
) -> Result<(StatusCode, Json<QuestionWithTranslation>), ApiError> {
    let question = state
        .question_service
        .create_question(body, Some(user.0.id))
        .await
        .map_err(|e| match e {
            QuestionServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// POST /api/questions/bulk-upload - Import questions from a CSV file
///
/// Requires admin. Accepts multipart/form-data with a `file` field holding
/// the CSV and an optional `language` field (default `en`) selecting the
/// translation language for the whole file. Row failures are reported in
/// the result, not as an HTTP error.
pub async fn bulk_upload(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<Json<BulkImportReport>, ApiError> {
    let mut csv_text: Option<String> = None;
    let mut language = Language::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::internal_error(format!("Failed to read file: {}", e)))?;
                let text = String::from_utf8(data.to_vec())
                    .map_err(|_| ApiError::validation_error("CSV file must be valid UTF-8"))?;
                csv_text = Some(text);
            }
            "language" => {
                let value = field.text().await.map_err(|e| {
                    ApiError::internal_error(format!("Failed to read language field: {}", e))
                })?;
                language = value
                    .parse()
                    .map_err(|_| ApiError::validation_error(format!("Invalid language: {}", value)))?;
            }
            _ => continue,
        }
    }

    let csv_text = csv_text.ok_or_else(|| ApiError::validation_error("No file provided"))?;

    let report = state
        .question_service
        .import_csv(&csv_text, language, Some(user.0.id))
        .await
        .map_err(|e| match e {
            QuestionServiceError::InvalidCsv(msg) => ApiError::validation_error(msg),
            _ => ApiError::internal_error(e.to_string()),
        })?;

    tracing::info!(
        total = report.total,
        success = report.success,
        failed = report.failed,
        "CSV question import finished"
    );

    Ok(Json(report))
}
