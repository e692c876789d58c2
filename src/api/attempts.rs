//! Quiz attempt API endpoints
//!
//! Handles HTTP requests for taking quizzes:
//! - POST /api/quiz-attempts - Start an attempt (signed-in or guest)
//! - GET /api/quiz-attempts/{id} - Attempt with quiz and recorded answers
//! - PUT /api/quiz-attempts/{id}/answer - Submit or replace an answer
//! - POST /api/quiz-attempts/{id}/complete - Complete and score
//! - POST /api/quiz-attempts/merge - Move guest attempts to the signed-in user
//! - GET /api/quiz-attempts/guest/{guest_id}/stats - Guest aggregate stats
//!
//! Attempt payloads withhold `correct_option_key` and `explanation` until
//! the attempt is completed, so an open quiz never leaks its answer key.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::api::common::LanguageQuery;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    AttemptDetail, AttemptOwner, AttemptResults, GuestStats, Language, OptionKey, QuestionAttempt,
    QuizAttempt,
};
use crate::services::quiz::QuizServiceError;

/// Request body for starting an attempt
#[derive(Debug, Deserialize)]
pub struct StartAttemptRequest {
    pub quiz_id: i64,
    /// Client-generated guest id; required when not signed in
    pub guest_id: Option<String>,
    #[serde(default)]
    pub language: Language,
}

/// Request body for submitting an answer
#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub question_id: i64,
    pub selected_option: OptionKey,
    /// Seconds spent on this question as reported by the client
    pub time_spent: Option<i64>,
    #[serde(default)]
    pub language: Language,
}

/// Request body for merging guest progress
#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub guest_id: String,
}

/// One quiz question as seen from inside an attempt.
///
/// The answer key fields are omitted from the JSON entirely while the
/// attempt is open.
#[derive(Debug, Serialize)]
pub struct AttemptQuestion {
    pub order: i64,
    pub points: i64,
    pub question_id: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_option_key: Option<OptionKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Quiz header plus its questions, as seen from inside an attempt
#[derive(Debug, Serialize)]
pub struct AttemptQuiz {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub time_limit: Option<i64>,
    pub questions: Vec<AttemptQuestion>,
}

/// Full attempt payload returned by start and get
#[derive(Debug, Serialize)]
pub struct AttemptResponse {
    #[serde(flatten)]
    pub attempt: QuizAttempt,
    pub quiz: AttemptQuiz,
    pub answers: Vec<QuestionAttempt>,
}

/// Response for completing an attempt
#[derive(Debug, Serialize)]
pub struct CompleteResponse {
    #[serde(flatten)]
    pub attempt: QuizAttempt,
    pub results: AttemptResults,
}

/// Response for merging guest progress
#[derive(Debug, Serialize)]
pub struct MergeResponse {
    pub merged: i64,
    pub message: String,
}

/// Map an attempt payload into the wire shape, revealing the answer key
/// only for completed attempts.
fn attempt_response(detail: AttemptDetail) -> AttemptResponse {
    let reveal = detail.attempt.is_completed;

    let questions = detail
        .quiz
        .questions
        .into_iter()
        .map(|slot| {
            let translation = slot.question.translation;
            AttemptQuestion {
                order: slot.order,
                points: slot.points,
                question_id: slot.question.question.id,
                question_text: translation.question_text,
                option_a: translation.option_a,
                option_b: translation.option_b,
                option_c: translation.option_c,
                option_d: translation.option_d,
                correct_option_key: reveal.then_some(translation.correct_option_key),
                explanation: if reveal { translation.explanation } else { None },
            }
        })
        .collect();

    AttemptResponse {
        attempt: detail.attempt,
        quiz: AttemptQuiz {
            id: detail.quiz.quiz.id,
            title: detail.quiz.quiz.title,
            description: detail.quiz.quiz.description,
            time_limit: detail.quiz.quiz.time_limit,
            questions,
        },
        answers: detail.answers,
    }
}

fn quiz_error(e: QuizServiceError) -> ApiError {
    match e {
        QuizServiceError::NotFound(msg) => ApiError::not_found(msg),
        QuizServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        QuizServiceError::AlreadyCompleted => {
            ApiError::conflict("Quiz attempt is already completed")
        }
        other => ApiError::internal_error(other.to_string()),
    }
}

/// POST /api/quiz-attempts - Start an attempt
///
/// Signed-in users own the attempt; otherwise a `guest_id` is required.
pub async fn start_attempt(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
    Json(body): Json<StartAttemptRequest>,
) -> Result<(StatusCode, Json<AttemptResponse>), ApiError> {
    let owner = match (user, body.guest_id) {
        (Some(user), _) => AttemptOwner::User(user.0.id),
        (None, Some(guest_id)) => AttemptOwner::Guest(guest_id),
        (None, None) => {
            return Err(ApiError::validation_error(
                "guest_id is required for guest attempts",
            ))
        }
    };

    let detail = state
        .quiz_service
        .start_attempt(body.quiz_id, owner, body.language)
        .await
        .map_err(quiz_error)?;

    Ok((StatusCode::CREATED, Json(attempt_response(detail))))
}

/// GET /api/quiz-attempts/{id} - Attempt with quiz and recorded answers
pub async fn get_attempt(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<LanguageQuery>,
) -> Result<Json<AttemptResponse>, ApiError> {
    let detail = state
        .quiz_service
        .get_attempt(id, query.language)
        .await
        .map_err(quiz_error)?;

    Ok(Json(attempt_response(detail)))
}

/// PUT /api/quiz-attempts/{id}/answer - Submit or replace an answer
///
/// Returns the recorded answer with its correctness judgement. Answers on
/// completed attempts are rejected with a conflict.
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<SubmitAnswerRequest>,
) -> Result<Json<QuestionAttempt>, ApiError> {
    let answer = state
        .quiz_service
        .submit_answer(
            id,
            body.question_id,
            body.selected_option,
            body.time_spent,
            body.language,
        )
        .await
        .map_err(quiz_error)?;

    Ok(Json(answer))
}

/// POST /api/quiz-attempts/{id}/complete - Complete and score an attempt
///
/// Exactly one completion wins; repeats get a conflict.
pub async fn complete_attempt(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<CompleteResponse>, ApiError> {
    let (attempt, results) = state
        .quiz_service
        .complete_attempt(id)
        .await
        .map_err(quiz_error)?;

    Ok(Json(CompleteResponse { attempt, results }))
}

/// POST /api/quiz-attempts/merge - Move guest attempts to the signed-in user
///
/// Requires authentication. Zero merged attempts is a success.
pub async fn merge_progress(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<MergeRequest>,
) -> Result<Json<MergeResponse>, ApiError> {
    let merged = state
        .quiz_service
        .merge_guest_progress(&body.guest_id, user.0.id)
        .await
        .map_err(quiz_error)?;

    let message = if merged > 0 {
        format!("Merged {} quiz attempts", merged)
    } else {
        "No guest progress to merge".to_string()
    };

    Ok(Json(MergeResponse { merged, message }))
}

/// GET /api/quiz-attempts/guest/{guest_id}/stats - Guest aggregate stats
pub async fn guest_stats(
    State(state): State<AppState>,
    Path(guest_id): Path<String>,
) -> Result<Json<GuestStats>, ApiError> {
    let stats = state
        .quiz_service
        .guest_stats(&guest_id)
        .await
        .map_err(quiz_error)?;

    Ok(Json(stats))
}
