//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP endpoints for the Pariksha platform:
//! - Question bank endpoints (list, create, CSV bulk upload)
//! - Quiz endpoints (public listing/detail, admin CRUD)
//! - Quiz attempt endpoints (start, answer, complete, guest merge/stats)
//! - Content catalog endpoints (exams, test series, notes)
//! - Hero section endpoints (carousel banners with image upload)
//! - Auth endpoints (Google OAuth flow, session introspection)
//! - Server-rendered homepage and static/PWA asset serving

pub mod attempts;
pub mod auth;
pub mod common;
pub mod content;
pub mod hero;
pub mod middleware;
pub mod pages;
pub mod questions;
pub mod quizzes;
pub mod static_files;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

/// Build the JSON API router (mounted at /api)
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (need admin role)
    let admin_routes = Router::new()
        .route("/questions", post(questions::create_question))
        .route("/questions/bulk-upload", post(questions::bulk_upload))
        .route("/quizzes", post(quizzes::create_quiz))
        .route("/quizzes/{id}", put(quizzes::update_quiz))
        .route("/quizzes/{id}", delete(quizzes::delete_quiz))
        .route("/hero-sections", post(hero::create_hero_section))
        .route("/hero-sections/{id}", put(hero::update_hero_section))
        .route("/hero-sections/{id}", delete(hero::delete_hero_section))
        .route("/exams", post(content::create_exam))
        .route("/exams/{id}", put(content::update_exam))
        .route("/exams/{id}", delete(content::delete_exam))
        .route("/test-series", post(content::create_test_series))
        .route("/test-series/{id}", put(content::update_test_series))
        .route("/test-series/{id}", delete(content::delete_test_series))
        .route("/notes", post(content::create_note))
        .route("/notes/{id}", put(content::update_note))
        .route("/notes/{id}", delete(content::delete_note))
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Protected routes (need auth but not admin)
    let protected_routes = Router::new()
        .route("/quiz-attempts/merge", post(attempts::merge_progress))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Routes where a session is used when present but never required:
    // starting an attempt binds it to the signed-in user, and the profile
    // endpoint reports the current account
    let optional_routes = Router::new()
        .route("/quiz-attempts", post(attempts::start_attempt))
        .nest("/auth", auth::optional_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ));

    // Public routes
    Router::new()
        .route("/questions", get(questions::list_questions))
        .route("/quizzes", get(quizzes::list_quizzes))
        .route("/quizzes/{id}", get(quizzes::get_quiz))
        .route("/quiz-attempts/{id}", get(attempts::get_attempt))
        .route("/quiz-attempts/{id}/answer", put(attempts::submit_answer))
        .route("/quiz-attempts/{id}/complete", post(attempts::complete_attempt))
        .route("/quiz-attempts/guest/{guest_id}/stats", get(attempts::guest_stats))
        .route("/hero-sections", get(hero::list_hero_sections))
        .route("/exams", get(content::list_exams))
        .route("/test-series", get(content::list_test_series))
        .route("/notes", get(content::list_notes))
        .nest("/auth", auth::public_router())
        .merge(admin_routes)
        .merge(protected_routes)
        .merge(optional_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    // CORS with credentials so the session cookie survives API calls
    let cors = CorsLayer::new()
        .allow_origin(cors_origin.parse::<HeaderValue>().unwrap())
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    // The homepage reads the session for its sign-in affordance
    let page_routes = Router::new()
        .route("/", get(pages::home_page))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::optional_auth,
        ));

    Router::new()
        .nest("/api", build_api_router(state.clone()))
        .nest("/auth", auth::redirect_router())
        .merge(page_routes)
        // PWA assets and /uploads/* (for production)
        .fallback(static_files::serve_static)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Router-level tests
// ============================================================================
