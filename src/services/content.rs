//! Content service
//!
//! The homepage surface: catalog cards (exams, test series, notes), the
//! hero carousel, and the cached payload the index template renders from.
//! Hero images arrive as raw bytes from the multipart layer and are
//! written beneath the upload directory; every admin write invalidates
//! the homepage cache.

use crate::cache::{Cache, CacheLayer};
use crate::db::repositories::{ContentRepository, HeroRepository};
use crate::models::{
    CreateExamInput, CreateNoteInput, CreateTestSeriesInput, Exam, HeroSection, Note, TestSeries,
    UpdateCardInput,
};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use uuid::Uuid;

/// Default cache TTL for the homepage payload (10 minutes)
const HOME_CACHE_TTL_SECS: u64 = 600;

/// Cache key for the assembled homepage payload
const CACHE_KEY_HOME: &str = "home:payload";

/// How many cards each homepage rail shows
const HOMEPAGE_RAIL_LIMIT: i64 = 10;

/// Subdirectory of the upload dir where hero images land
const HERO_SUBDIR: &str = "hero";

/// Maximum accepted hero image size (5 MB)
const MAX_HERO_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Error types for content service operations
#[derive(Debug, thiserror::Error)]
pub enum ContentServiceError {
    /// Card or hero section not found
    #[error("{0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Raw file contents plucked from a multipart `image` field
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied filename, used only for the extension
    pub filename: String,
    /// Declared content type, must be `image/*`
    pub content_type: String,
    /// File bytes
    pub data: Vec<u8>,
}

/// Everything the homepage renders: carousel banners plus the first
/// cards of each catalog rail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomePayload {
    pub hero_sections: Vec<HeroSection>,
    pub exams: Vec<Exam>,
    pub test_series: Vec<TestSeries>,
    pub notes: Vec<Note>,
}

/// Content service for the catalog rails and hero carousel
pub struct ContentService {
    content_repo: Arc<dyn ContentRepository>,
    hero_repo: Arc<dyn HeroRepository>,
    cache: Arc<Cache>,
    upload_dir: PathBuf,
    cache_ttl: Duration,
}

impl ContentService {
    /// Create a new content service
    ///
    /// # Arguments
    /// * `content_repo` - Catalog repository for exams/test series/notes
    /// * `hero_repo` - Hero section repository
    /// * `cache` - Cache layer for the homepage payload
    /// * `upload_dir` - Root directory for uploaded files
    pub fn new(
        content_repo: Arc<dyn ContentRepository>,
        hero_repo: Arc<dyn HeroRepository>,
        cache: Arc<Cache>,
        upload_dir: PathBuf,
    ) -> Self {
        Self {
            content_repo,
            hero_repo,
            cache,
            upload_dir,
            cache_ttl: Duration::from_secs(HOME_CACHE_TTL_SECS),
        }
    }

    /// Create a new content service with a custom homepage cache TTL
    pub fn with_cache_ttl(
        content_repo: Arc<dyn ContentRepository>,
        hero_repo: Arc<dyn HeroRepository>,
        cache: Arc<Cache>,
        upload_dir: PathBuf,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            content_repo,
            hero_repo,
            cache,
            upload_dir,
            cache_ttl,
        }
    }

    // === Homepage ===

    /// Assemble the homepage payload, serving from cache when possible
    ///
    /// The payload is all hero sections plus the first ten cards of each
    /// catalog rail. Any admin write to those tables invalidates it.
    pub async fn home_payload(&self) -> Result<HomePayload, ContentServiceError> {
        if let Ok(Some(cached)) = self.cache.get::<HomePayload>(CACHE_KEY_HOME).await {
            return Ok(cached);
        }

        let hero_sections = self
            .hero_repo
            .list()
            .await
            .context("Failed to list hero sections")?;
        let exams = self
            .content_repo
            .list_exams(Some(HOMEPAGE_RAIL_LIMIT))
            .await
            .context("Failed to list exams")?;
        let test_series = self
            .content_repo
            .list_test_series(Some(HOMEPAGE_RAIL_LIMIT))
            .await
            .context("Failed to list test series")?;
        let notes = self
            .content_repo
            .list_notes(Some(HOMEPAGE_RAIL_LIMIT))
            .await
            .context("Failed to list notes")?;

        let payload = HomePayload {
            hero_sections,
            exams,
            test_series,
            notes,
        };

        // Best effort: a cold cache never fails the page
        let _ = self.cache.set(CACHE_KEY_HOME, &payload, self.cache_ttl).await;

        Ok(payload)
    }

    // === Catalog: exams ===

    /// List all exam cards
    pub async fn list_exams(&self) -> Result<Vec<Exam>, ContentServiceError> {
        Ok(self
            .content_repo
            .list_exams(None)
            .await
            .context("Failed to list exams")?)
    }

    /// Create an exam card
    pub async fn create_exam(&self, input: CreateExamInput) -> Result<Exam, ContentServiceError> {
        validate_card(&input.title, &input.image_url)?;

        let exam = self
            .content_repo
            .create_exam(&input)
            .await
            .context("Failed to create exam")?;
        self.invalidate_home_cache().await?;

        tracing::info!(exam_id = exam.id, title = %exam.title, "Created exam");
        Ok(exam)
    }

    /// Update an exam card's title and/or image URL
    pub async fn update_exam(
        &self,
        id: i64,
        input: UpdateCardInput,
    ) -> Result<Exam, ContentServiceError> {
        validate_card_update(&input)?;

        let exam = self
            .content_repo
            .update_exam(id, &input)
            .await
            .context("Failed to update exam")?
            .ok_or_else(|| ContentServiceError::NotFound(format!("Exam not found: {}", id)))?;
        self.invalidate_home_cache().await?;

        tracing::info!(exam_id = id, "Updated exam");
        Ok(exam)
    }

    /// Delete an exam card
    pub async fn delete_exam(&self, id: i64) -> Result<(), ContentServiceError> {
        let deleted = self
            .content_repo
            .delete_exam(id)
            .await
            .context("Failed to delete exam")?;
        if !deleted {
            return Err(ContentServiceError::NotFound(format!(
                "Exam not found: {}",
                id
            )));
        }
        self.invalidate_home_cache().await?;

        tracing::info!(exam_id = id, "Deleted exam");
        Ok(())
    }

    // === Catalog: test series ===

    /// List all test series cards
    pub async fn list_test_series(&self) -> Result<Vec<TestSeries>, ContentServiceError> {
        Ok(self
            .content_repo
            .list_test_series(None)
            .await
            .context("Failed to list test series")?)
    }

    /// Create a test series card
    pub async fn create_test_series(
        &self,
        input: CreateTestSeriesInput,
    ) -> Result<TestSeries, ContentServiceError> {
        validate_card(&input.title, &input.image_url)?;

        let series = self
            .content_repo
            .create_test_series(&input)
            .await
            .context("Failed to create test series")?;
        self.invalidate_home_cache().await?;

        tracing::info!(test_series_id = series.id, title = %series.title, "Created test series");
        Ok(series)
    }

    /// Update a test series card's title and/or image URL
    pub async fn update_test_series(
        &self,
        id: i64,
        input: UpdateCardInput,
    ) -> Result<TestSeries, ContentServiceError> {
        validate_card_update(&input)?;

        let series = self
            .content_repo
            .update_test_series(id, &input)
            .await
            .context("Failed to update test series")?
            .ok_or_else(|| {
                ContentServiceError::NotFound(format!("Test series not found: {}", id))
            })?;
        self.invalidate_home_cache().await?;

        tracing::info!(test_series_id = id, "Updated test series");
        Ok(series)
    }

    /// Delete a test series card
    pub async fn delete_test_series(&self, id: i64) -> Result<(), ContentServiceError> {
        let deleted = self
            .content_repo
            .delete_test_series(id)
            .await
            .context("Failed to delete test series")?;
        if !deleted {
            return Err(ContentServiceError::NotFound(format!(
                "Test series not found: {}",
                id
            )));
        }
        self.invalidate_home_cache().await?;

        tracing::info!(test_series_id = id, "Deleted test series");
        Ok(())
    }

    // === Catalog: notes ===

    /// List all notes cards
    pub async fn list_notes(&self) -> Result<Vec<Note>, ContentServiceError> {
        Ok(self
            .content_repo
            .list_notes(None)
            .await
            .context("Failed to list notes")?)
    }

    /// Create a notes card
    pub async fn create_note(&self, input: CreateNoteInput) -> Result<Note, ContentServiceError> {
        validate_card(&input.title, &input.image_url)?;

        let note = self
            .content_repo
            .create_note(&input)
            .await
            .context("Failed to create note")?;
        self.invalidate_home_cache().await?;

        tracing::info!(note_id = note.id, title = %note.title, "Created note");
        Ok(note)
    }

    /// Update a notes card's title and/or image URL
    pub async fn update_note(
        &self,
        id: i64,
        input: UpdateCardInput,
    ) -> Result<Note, ContentServiceError> {
        validate_card_update(&input)?;

        let note = self
            .content_repo
            .update_note(id, &input)
            .await
            .context("Failed to update note")?
            .ok_or_else(|| ContentServiceError::NotFound(format!("Note not found: {}", id)))?;
        self.invalidate_home_cache().await?;

        tracing::info!(note_id = id, "Updated note");
        Ok(note)
    }

    /// Delete a notes card
    pub async fn delete_note(&self, id: i64) -> Result<(), ContentServiceError> {
        let deleted = self
            .content_repo
            .delete_note(id)
            .await
            .context("Failed to delete note")?;
        if !deleted {
            return Err(ContentServiceError::NotFound(format!(
                "Note not found: {}",
                id
            )));
        }
        self.invalidate_home_cache().await?;

        tracing::info!(note_id = id, "Deleted note");
        Ok(())
    }

    // === Hero sections ===

    /// List all hero sections in carousel order
    pub async fn list_hero_sections(&self) -> Result<Vec<HeroSection>, ContentServiceError> {
        Ok(self
            .hero_repo
            .list()
            .await
            .context("Failed to list hero sections")?)
    }

    /// Create a hero section from overlay text and an uploaded image
    pub async fn create_hero_section(
        &self,
        text: &str,
        image: ImageUpload,
    ) -> Result<HeroSection, ContentServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ContentServiceError::ValidationError(
                "Hero text is required".to_string(),
            ));
        }

        let image_url = self.store_hero_image(&image).await?;
        let hero = self
            .hero_repo
            .create(text, &image_url)
            .await
            .context("Failed to create hero section")?;
        self.invalidate_home_cache().await?;

        tracing::info!(hero_id = hero.id, "Created hero section");
        Ok(hero)
    }

    /// Update a hero section's text, optionally replacing its image
    ///
    /// When a new image is supplied the old file is removed best effort
    /// after the row update succeeds.
    pub async fn update_hero_section(
        &self,
        id: i64,
        text: &str,
        image: Option<ImageUpload>,
    ) -> Result<HeroSection, ContentServiceError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ContentServiceError::ValidationError(
                "Hero text is required".to_string(),
            ));
        }

        let existing = self
            .hero_repo
            .get(id)
            .await
            .context("Failed to load hero section")?
            .ok_or_else(|| {
                ContentServiceError::NotFound(format!("Hero section not found: {}", id))
            })?;

        let new_url = match image {
            Some(image) => Some(self.store_hero_image(&image).await?),
            None => None,
        };

        let hero = self
            .hero_repo
            .update(id, text, new_url.as_deref())
            .await
            .context("Failed to update hero section")?
            .ok_or_else(|| {
                ContentServiceError::NotFound(format!("Hero section not found: {}", id))
            })?;

        if new_url.is_some() {
            self.remove_image_file(&existing.image_url).await;
        }
        self.invalidate_home_cache().await?;

        tracing::info!(hero_id = id, "Updated hero section");
        Ok(hero)
    }

    /// Delete a hero section, removing its image file best effort
    pub async fn delete_hero_section(&self, id: i64) -> Result<(), ContentServiceError> {
        let existing = self
            .hero_repo
            .get(id)
            .await
            .context("Failed to load hero section")?
            .ok_or_else(|| {
                ContentServiceError::NotFound(format!("Hero section not found: {}", id))
            })?;

        let deleted = self
            .hero_repo
            .delete(id)
            .await
            .context("Failed to delete hero section")?;
        if !deleted {
            return Err(ContentServiceError::NotFound(format!(
                "Hero section not found: {}",
                id
            )));
        }

        // Row first, then the file: a stray file is recoverable, a stray
        // row pointing at a deleted file is not
        self.remove_image_file(&existing.image_url).await;
        self.invalidate_home_cache().await?;

        tracing::info!(hero_id = id, "Deleted hero section");
        Ok(())
    }

    // === Image storage ===

    /// Validate and persist an uploaded hero image, returning its public URL
    async fn store_hero_image(&self, image: &ImageUpload) -> Result<String, ContentServiceError> {
        if !image.content_type.starts_with("image/") {
            return Err(ContentServiceError::ValidationError(format!(
                "File must be an image, got {}",
                image.content_type
            )));
        }
        if image.data.is_empty() {
            return Err(ContentServiceError::ValidationError(
                "Image file is empty".to_string(),
            ));
        }
        if image.data.len() as u64 > MAX_HERO_IMAGE_BYTES {
            return Err(ContentServiceError::ValidationError(format!(
                "File size must be less than {} MB",
                MAX_HERO_IMAGE_BYTES / 1024 / 1024
            )));
        }

        let dir = self.upload_dir.join(HERO_SUBDIR);
        fs::create_dir_all(&dir)
            .await
            .context("Failed to create hero upload directory")?;

        let ext = image_extension(&image.filename, &image.content_type);
        let filename = format!("hero_{}.{}", Uuid::new_v4(), ext);
        fs::write(dir.join(&filename), &image.data)
            .await
            .context("Failed to save hero image")?;

        Ok(format!("/uploads/{}/{}", HERO_SUBDIR, filename))
    }

    /// Best-effort removal of a stored image by its public URL
    ///
    /// Seeded hero rows point at external URLs; those are left alone.
    async fn remove_image_file(&self, image_url: &str) {
        let Some(relative) = image_url.strip_prefix("/uploads/") else {
            return;
        };
        if relative.contains("..") {
            return;
        }
        let path = self.upload_dir.join(relative);
        if let Err(e) = fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), error = %e, "Could not delete image file");
        }
    }

    /// Drop the cached homepage payload after an admin write
    async fn invalidate_home_cache(&self) -> Result<(), ContentServiceError> {
        self.cache
            .delete(CACHE_KEY_HOME)
            .await
            .context("Failed to invalidate homepage cache")?;
        Ok(())
    }
}

/// Validate required card fields
fn validate_card(title: &str, image_url: &str) -> Result<(), ContentServiceError> {
    if title.trim().is_empty() {
        return Err(ContentServiceError::ValidationError(
            "Title is required".to_string(),
        ));
    }
    if image_url.trim().is_empty() {
        return Err(ContentServiceError::ValidationError(
            "Image URL is required".to_string(),
        ));
    }
    Ok(())
}

/// Validate a card update: provided fields must not be blank
fn validate_card_update(input: &UpdateCardInput) -> Result<(), ContentServiceError> {
    if let Some(title) = &input.title {
        if title.trim().is_empty() {
            return Err(ContentServiceError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
    }
    if let Some(image_url) = &input.image_url {
        if image_url.trim().is_empty() {
            return Err(ContentServiceError::ValidationError(
                "Image URL cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

/// Pick a file extension from the uploaded filename, falling back to the
/// content type
fn image_extension(filename: &str, content_type: &str) -> String {
    if let Some((_, ext)) = filename.rsplit_once('.') {
        if !ext.is_empty() && ext.len() < 10 {
            return ext.to_lowercase();
        }
    }

    match content_type {
        "image/jpeg" => "jpg".to_string(),
        "image/png" => "png".to_string(),
        "image/gif" => "gif".to_string(),
        "image/webp" => "webp".to_string(),
        "image/svg+xml" => "svg".to_string(),
        _ => "jpg".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::{SqlxContentRepository, SqlxHeroRepository};
    use crate::db::{create_test_pool, migrations};
    use tempfile::TempDir;

    async fn setup_test_service() -> (ContentService, TempDir) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let cache = create_cache(&CacheConfig::default())
            .await
            .expect("Failed to create cache");
        let upload_dir = TempDir::new().expect("Failed to create temp dir");

        let service = ContentService::new(
            SqlxContentRepository::boxed(pool.clone()),
            SqlxHeroRepository::boxed(pool),
            cache,
            upload_dir.path().to_path_buf(),
        );

        (service, upload_dir)
    }

    fn png_upload() -> ImageUpload {
        ImageUpload {
            filename: "banner.png".to_string(),
            content_type: "image/png".to_string(),
            data: vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0],
        }
    }

    /// Map a `/uploads/...` URL back to its on-disk path
    fn stored_path(upload_dir: &TempDir, url: &str) -> std::path::PathBuf {
        let relative = url.strip_prefix("/uploads/").expect("URL not under /uploads/");
        upload_dir.path().join(relative)
    }

    #[tokio::test]
    async fn test_home_payload_collects_rails() {
        let (service, _dir) = setup_test_service().await;

        let payload = service.home_payload().await.unwrap();

        // Starter rows from the migrations
        assert_eq!(payload.exams.len(), 3);
        assert_eq!(payload.test_series.len(), 3);
        assert_eq!(payload.notes.len(), 3);
        assert_eq!(payload.hero_sections.len(), 3);
        assert!(payload.exams.iter().any(|e| e.title.contains("UPSC")));
    }

    #[tokio::test]
    async fn test_home_payload_caps_rails_at_ten() {
        let (service, _dir) = setup_test_service().await;

        for i in 0..12 {
            service
                .create_exam(CreateExamInput {
                    title: format!("Exam {}", i),
                    image_url: "/img/e.png".to_string(),
                })
                .await
                .unwrap();
        }

        let payload = service.home_payload().await.unwrap();
        assert_eq!(payload.exams.len(), 10);
        // Full listing is uncapped
        assert_eq!(service.list_exams().await.unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_home_payload_cached_until_admin_write() {
        let (service, _dir) = setup_test_service().await;

        let before = service.home_payload().await.unwrap();
        let baseline = before.exams.len();

        // A fresh write invalidates the cached payload
        service
            .create_exam(CreateExamInput {
                title: "Judiciary".to_string(),
                image_url: "/img/judiciary.png".to_string(),
            })
            .await
            .unwrap();

        let after = service.home_payload().await.unwrap();
        assert_eq!(after.exams.len(), baseline + 1);
        assert!(after.exams.iter().any(|e| e.title == "Judiciary"));
    }

    #[tokio::test]
    async fn test_create_exam_requires_title() {
        let (service, _dir) = setup_test_service().await;

        let result = service
            .create_exam(CreateExamInput {
                title: "   ".to_string(),
                image_url: "/img/e.png".to_string(),
            })
            .await;

        assert!(matches!(
            result,
            Err(ContentServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_update_exam_changes_title() {
        let (service, _dir) = setup_test_service().await;

        let exam = service
            .create_exam(CreateExamInput {
                title: "RBI Grade B".to_string(),
                image_url: "/img/rbi.png".to_string(),
            })
            .await
            .unwrap();

        let updated = service
            .update_exam(
                exam.id,
                UpdateCardInput {
                    title: Some("RBI Grade B Officer".to_string()),
                    image_url: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "RBI Grade B Officer");
        assert_eq!(updated.image_url, "/img/rbi.png");
    }

    #[tokio::test]
    async fn test_update_unknown_exam_not_found() {
        let (service, _dir) = setup_test_service().await;

        let result = service
            .update_exam(
                9999,
                UpdateCardInput {
                    title: Some("Ghost".to_string()),
                    image_url: None,
                },
            )
            .await;

        assert!(matches!(result, Err(ContentServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_exam_removes_card() {
        let (service, _dir) = setup_test_service().await;

        let exam = service
            .create_exam(CreateExamInput {
                title: "Short Lived".to_string(),
                image_url: "/img/x.png".to_string(),
            })
            .await
            .unwrap();

        service.delete_exam(exam.id).await.unwrap();

        let exams = service.list_exams().await.unwrap();
        assert!(!exams.iter().any(|e| e.id == exam.id));

        let again = service.delete_exam(exam.id).await;
        assert!(matches!(again, Err(ContentServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_test_series_links_exam() {
        let (service, _dir) = setup_test_service().await;

        let exam = service
            .create_exam(CreateExamInput {
                title: "CAT".to_string(),
                image_url: "/img/cat.png".to_string(),
            })
            .await
            .unwrap();

        let series = service
            .create_test_series(CreateTestSeriesInput {
                title: "CAT Mocks".to_string(),
                image_url: "/img/cat-mocks.png".to_string(),
                exam_id: Some(exam.id),
            })
            .await
            .unwrap();

        assert_eq!(series.exam_id, Some(exam.id));
    }

    #[tokio::test]
    async fn test_note_carries_uploader() {
        let (service, _dir) = setup_test_service().await;

        let note = service
            .create_note(CreateNoteInput {
                title: "Modern History".to_string(),
                image_url: "/img/history.png".to_string(),
                user_id: None,
            })
            .await
            .unwrap();

        assert_eq!(note.user_id, None);
        assert_eq!(note.title, "Modern History");
    }

    #[tokio::test]
    async fn test_create_hero_section_stores_image() {
        let (service, dir) = setup_test_service().await;

        let upload = png_upload();
        let expected_len = upload.data.len() as u64;
        let hero = service
            .create_hero_section("Crack your exam", upload)
            .await
            .unwrap();

        assert_eq!(hero.text, "Crack your exam");
        assert!(hero.image_url.starts_with("/uploads/hero/hero_"));
        assert!(hero.image_url.ends_with(".png"));

        let on_disk = std::fs::metadata(stored_path(&dir, &hero.image_url)).unwrap();
        assert_eq!(on_disk.len(), expected_len);
    }

    #[tokio::test]
    async fn test_create_hero_section_requires_text() {
        let (service, _dir) = setup_test_service().await;

        let result = service.create_hero_section("  ", png_upload()).await;
        assert!(matches!(
            result,
            Err(ContentServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_hero_image_must_be_an_image() {
        let (service, _dir) = setup_test_service().await;

        let upload = ImageUpload {
            filename: "notes.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: vec![1, 2, 3],
        };

        let result = service.create_hero_section("Banner", upload).await;
        match result {
            Err(ContentServiceError::ValidationError(msg)) => {
                assert!(msg.contains("must be an image"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_hero_image_size_capped() {
        let (service, _dir) = setup_test_service().await;

        let upload = ImageUpload {
            filename: "huge.png".to_string(),
            content_type: "image/png".to_string(),
            data: vec![0u8; (MAX_HERO_IMAGE_BYTES + 1) as usize],
        };

        let result = service.create_hero_section("Banner", upload).await;
        match result {
            Err(ContentServiceError::ValidationError(msg)) => {
                assert!(msg.contains("5 MB"));
            }
            other => panic!("Expected ValidationError, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_hero_section_replaces_image() {
        let (service, dir) = setup_test_service().await;

        let hero = service
            .create_hero_section("Old banner", png_upload())
            .await
            .unwrap();
        let old_path = stored_path(&dir, &hero.image_url);
        assert!(old_path.exists());

        let updated = service
            .update_hero_section(hero.id, "New banner", Some(png_upload()))
            .await
            .unwrap();

        assert_eq!(updated.text, "New banner");
        assert_ne!(updated.image_url, hero.image_url);
        assert!(!old_path.exists());
        assert!(stored_path(&dir, &updated.image_url).exists());
    }

    #[tokio::test]
    async fn test_update_hero_section_keeps_image_when_absent() {
        let (service, dir) = setup_test_service().await;

        let hero = service
            .create_hero_section("Banner", png_upload())
            .await
            .unwrap();

        let updated = service
            .update_hero_section(hero.id, "Reworded banner", None)
            .await
            .unwrap();

        assert_eq!(updated.text, "Reworded banner");
        assert_eq!(updated.image_url, hero.image_url);
        assert!(stored_path(&dir, &hero.image_url).exists());
    }

    #[tokio::test]
    async fn test_delete_hero_section_removes_file() {
        let (service, dir) = setup_test_service().await;

        let hero = service
            .create_hero_section("Doomed banner", png_upload())
            .await
            .unwrap();
        let path = stored_path(&dir, &hero.image_url);
        assert!(path.exists());

        service.delete_hero_section(hero.id).await.unwrap();
        assert!(!path.exists());

        let again = service.delete_hero_section(hero.id).await;
        assert!(matches!(again, Err(ContentServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_seeded_hero_leaves_external_url_alone() {
        let (service, _dir) = setup_test_service().await;

        // Seeded rows point at external image URLs; deletion must not
        // touch the filesystem for those
        service.delete_hero_section(1).await.unwrap();

        let remaining = service.list_hero_sections().await.unwrap();
        assert!(!remaining.iter().any(|h| h.id == 1));
    }

    #[test]
    fn test_image_extension_prefers_filename() {
        assert_eq!(image_extension("photo.JPEG", "image/png"), "jpeg");
        assert_eq!(image_extension("archive.tar.gz", "image/png"), "gz");
    }

    #[test]
    fn test_image_extension_falls_back_to_content_type() {
        assert_eq!(image_extension("", "image/webp"), "webp");
        assert_eq!(image_extension("", "image/x-unknown"), "jpg");
    }

    #[test]
    fn test_image_extension_ignores_dotless_filename() {
        assert_eq!(image_extension("banner", "image/png"), "png");
        assert_eq!(image_extension("banner", "image/x-unknown"), "jpg");
    }
}
