//! Server-rendered pages
//!
//! The homepage is rendered with tera from templates embedded in the
//! binary: hero carousel, the first cards of each catalog rail, and the
//! sign-in affordance in the header. OAuth redirect failures land back
//! here with an `error` query parameter that renders as a banner.

use axum::{
    extract::{Query, State},
    response::Html,
};
use rust_embed::RustEmbed;
use serde::Deserialize;
use tera::{Context, Tera};

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};

/// Page templates compiled into the binary
#[derive(RustEmbed)]
#[folder = "templates/"]
struct Templates;

/// Load the embedded templates into a tera instance
pub fn build_templates() -> anyhow::Result<Tera> {
    let mut tera = Tera::default();

    for path in Templates::iter() {
        let file = Templates::get(&path)
            .ok_or_else(|| anyhow::anyhow!("Missing embedded template: {}", path))?;
        let content = std::str::from_utf8(file.data.as_ref())
            .map_err(|e| anyhow::anyhow!("Template {} is not valid UTF-8: {}", path, e))?;
        tera.add_raw_template(&path, content)?;
    }

    tera.build_inheritance_chains()?;
    Ok(tera)
}

/// Query parameters for the homepage
#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    /// Error message from an OAuth redirect, shown as a banner
    pub error: Option<String>,
}

/// GET / - Homepage
pub async fn home_page(
    State(state): State<AppState>,
    Query(query): Query<HomeQuery>,
    user: Option<AuthenticatedUser>,
) -> Result<Html<String>, ApiError> {
    let payload = state
        .content_service
        .home_payload()
        .await
        .map_err(|e| ApiError::internal_error(e.to_string()))?;

    let mut context = Context::new();
    context.insert("hero_sections", &payload.hero_sections);
    context.insert("exams", &payload.exams);
    context.insert("test_series", &payload.test_series);
    context.insert("notes", &payload.notes);
    context.insert("user", &user.map(|u| u.0));
    context.insert("error", &query.error);

    let html = state
        .templates
        .render("index.html", &context)
        .map_err(|e| ApiError::internal_error(format!("Failed to render homepage: {}", e)))?;

    Ok(Html(html))
}
