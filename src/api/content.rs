//! Catalog API endpoints
//!
//! Handles HTTP requests for the three homepage card rails:
//! - GET /api/exams, POST /api/exams, PUT/DELETE /api/exams/{id}
//! - GET /api/test-series, POST /api/test-series, PUT/DELETE /api/test-series/{id}
//! - GET /api/notes, POST /api/notes, PUT/DELETE /api/notes/{id}
//!
//! Listings are public; every mutation requires admin.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    CreateExamInput, CreateNoteInput, CreateTestSeriesInput, Exam, Note, TestSeries,
    UpdateCardInput,
};
use crate::services::content::ContentServiceError;

fn content_error(e: ContentServiceError) -> ApiError {
    match e {
        ContentServiceError::NotFound(msg) => ApiError::not_found(msg),
        ContentServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        other => ApiError::internal_error(other.to_string()),
    }
}

// === Exams ===

/// GET /api/exams - List exam cards, newest first
pub async fn list_exams(State(state): State<AppState>) -> Result<Json<Vec<Exam>>, ApiError> {
    let exams = state.content_service.list_exams().await.map_err(content_error)?;
    Ok(Json(exams))
}

/// POST /api/exams - Create an exam card (admin)
pub async fn create_exam(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(body): Json<CreateExamInput>,
) -> Result<(StatusCode, Json<Exam>), ApiError> {
    let exam = state
        .content_service
        .create_exam(body)
        .await
        .map_err(content_error)?;

    Ok((StatusCode::CREATED, Json(exam)))
}

/// PUT /api/exams/{id} - Update an exam card (admin)
pub async fn update_exam(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCardInput>,
) -> Result<Json<Exam>, ApiError> {
    let exam = state
        .content_service
        .update_exam(id, body)
        .await
        .map_err(content_error)?;

    Ok(Json(exam))
}

/// DELETE /api/exams/{id} - Delete an exam card (admin)
pub async fn delete_exam(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.content_service.delete_exam(id).await.map_err(content_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// === Test series ===

/// GET /api/test-series - List test series cards, newest first
pub async fn list_test_series(
    State(state): State<AppState>,
) -> Result<Json<Vec<TestSeries>>, ApiError> {
    let series = state
        .content_service
        .list_test_series()
        .await
        .map_err(content_error)?;

    Ok(Json(series))
}

/// POST /api/test-series - Create a test series card (admin)
pub async fn create_test_series(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Json(body): Json<CreateTestSeriesInput>,
) -> Result<(StatusCode, Json<TestSeries>), ApiError> {
    let series = state
        .content_service
        .create_test_series(body)
        .await
        .map_err(content_error)?;

    Ok((StatusCode::CREATED, Json(series)))
}

/// PUT /api/test-series/{id} - Update a test series card (admin)
pub async fn update_test_series(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCardInput>,
) -> Result<Json<TestSeries>, ApiError> {
    let series = state
        .content_service
        .update_test_series(id, body)
        .await
        .map_err(content_error)?;

    Ok(Json(series))
}

/// DELETE /api/test-series/{id} - Delete a test series card (admin)
pub async fn delete_test_series(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .content_service
        .delete_test_series(id)
        .await
        .map_err(content_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// === Notes ===

/// GET /api/notes - List notes cards, newest first
pub async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.content_service.list_notes().await.map_err(content_error)?;
    Ok(Json(notes))
}

/// POST /api/notes - Create a notes card (admin)
///
/// The uploading admin is recorded on the card.
pub async fn create_note(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(mut body): Json<CreateNoteInput>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    body.user_id = Some(user.0.id);

    let note = state
        .content_service
        .create_note(body)
        .await
        .map_err(content_error)?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// PUT /api/notes/{id} - Update a notes card (admin)
pub async fn update_note(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<UpdateCardInput>,
) -> Result<Json<Note>, ApiError> {
    let note = state
        .content_service
        .update_note(id, body)
        .await
        .map_err(content_error)?;

    Ok(Json(note))
}

/// DELETE /api/notes/{id} - Delete a notes card (admin)
pub async fn delete_note(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.content_service.delete_note(id).await.map_err(content_error)?;
    Ok(StatusCode::NO_CONTENT)
}
