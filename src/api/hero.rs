//! Hero carousel API endpoints
//!
//! Handles HTTP requests for the homepage banner carousel:
//! - GET /api/hero-sections - Public listing, newest first
//! - POST /api/hero-sections - Create banner from multipart form (admin)
//! - PUT /api/hero-sections/{id} - Update text, optionally replace image (admin)
//! - DELETE /api/hero-sections/{id} - Delete banner and its image file (admin)
//!
//! Create and update take `multipart/form-data` with a `text` field and an
//! `image` file field, matching the admin console's upload form.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::HeroSection;
use crate::services::content::{ContentServiceError, ImageUpload};

fn content_error(e: ContentServiceError) -> ApiError {
    match e {
        ContentServiceError::NotFound(msg) => ApiError::not_found(msg),
        ContentServiceError::ValidationError(msg) => ApiError::validation_error(msg),
        other => ApiError::internal_error(other.to_string()),
    }
}

/// Pull the `text` and `image` fields out of a hero form
async fn read_hero_form(
    multipart: &mut Multipart,
) -> Result<(Option<String>, Option<ImageUpload>), ApiError> {
    let mut text = None;
    let mut image = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to read multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "text" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::internal_error(format!("Failed to read field: {}", e)))?;
                text = Some(value);
            }
            "image" => {
                let filename = field.file_name().unwrap_or("banner").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::internal_error(format!("Failed to read file: {}", e)))?;
                image = Some(ImageUpload {
                    filename,
                    content_type,
                    data: data.to_vec(),
                });
            }
            _ => {}
        }
    }

    Ok((text, image))
}

/// GET /api/hero-sections - List carousel banners, newest first
pub async fn list_hero_sections(
    State(state): State<AppState>,
) -> Result<Json<Vec<HeroSection>>, ApiError> {
    let sections = state
        .content_service
        .list_hero_sections()
        .await
        .map_err(content_error)?;

    Ok(Json(sections))
}

/// POST /api/hero-sections - Create a banner
///
/// Requires admin. Expects multipart fields `text` and `image`.
pub async fn create_hero_section(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<HeroSection>), ApiError> {
    let (text, image) = read_hero_form(&mut multipart).await?;

    let text = text.ok_or_else(|| ApiError::validation_error("Hero text is required"))?;
    let image = image.ok_or_else(|| ApiError::validation_error("Hero image is required"))?;

    let hero = state
        .content_service
        .create_hero_section(&text, image)
        .await
        .map_err(content_error)?;

    Ok((StatusCode::CREATED, Json(hero)))
}

/// PUT /api/hero-sections/{id} - Update a banner
///
/// Requires admin. The `image` field is optional; without it only the
/// text changes.
pub async fn update_hero_section(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> Result<Json<HeroSection>, ApiError> {
    let (text, image) = read_hero_form(&mut multipart).await?;

    let text = text.ok_or_else(|| ApiError::validation_error("Hero text is required"))?;

    let hero = state
        .content_service
        .update_hero_section(id, &text, image)
        .await
        .map_err(content_error)?;

    Ok(Json(hero))
}

/// DELETE /api/hero-sections/{id} - Delete a banner
///
/// Requires admin. Removes the stored image file as well.
pub async fn delete_hero_section(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state
        .content_service
        .delete_hero_section(id)
        .await
        .map_err(content_error)?;

    Ok(StatusCode::NO_CONTENT)
}
