//! Static file serving
//!
//! Router fallback for everything that is not a page or an API route:
//! - the PWA assets (`manifest.json`, `service-worker.js`, stylesheet,
//!   icon) embedded in the binary,
//! - `/uploads/*` served from the configured upload directory on disk.

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode, Uri},
    response::Response,
};
use rust_embed::RustEmbed;
use std::path::{Component, Path, PathBuf};
use tokio::fs;

use crate::api::middleware::AppState;

/// Embedded front-end assets (PWA manifest, service worker, stylesheet, icon)
#[derive(RustEmbed)]
#[folder = "assets/"]
#[include = "*"]
struct Assets;

/// Serve static files based on path
pub async fn serve_static(State(state): State<AppState>, uri: Uri) -> Response {
    let path = uri.path();
    // URL decode so encoded upload filenames resolve on disk
    let decoded_path = urlencoding::decode(path).unwrap_or_else(|_| path.into());
    let path = decoded_path.as_ref();

    // /uploads/* -> uploaded files from disk
    if let Some(relative) = path.strip_prefix("/uploads/") {
        return serve_upload(&state.upload_config.path, relative).await;
    }

    // Everything else -> embedded assets
    let asset_path = path.trim_start_matches('/');
    match Assets::get(asset_path) {
        Some(content) => build_response(asset_path, &content.data),
        None => not_found(),
    }
}

/// Serve an uploaded file from the upload directory
///
/// The relative path comes straight from the URL, so parent-directory
/// components are rejected before touching the filesystem.
async fn serve_upload(upload_dir: &Path, relative: &str) -> Response {
    let relative_path = PathBuf::from(relative);
    let escapes = relative_path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if escapes {
        return not_found();
    }

    let file_path = upload_dir.join(relative_path);
    match fs::read(&file_path).await {
        Ok(contents) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, get_content_type(relative))
            .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
            .body(Body::from(contents))
            .unwrap(),
        Err(_) => not_found(),
    }
}

fn build_response(path: &str, data: &[u8]) -> Response {
    // The service worker script must not be cached or updates never land
    let cache_control = if path == "service-worker.js" {
        "no-cache"
    } else {
        "public, max-age=3600"
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, get_content_type(path))
        .header(header::CACHE_CONTROL, cache_control)
        .body(Body::from(data.to_vec()))
        .unwrap()
}

fn not_found() -> Response {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(Body::from("404 Not Found"))
        .unwrap()
}

/// Get content type from file extension
fn get_content_type(path: &str) -> &'static str {
    match path.rsplit('.').next().unwrap_or("") {
        "html" => "text/html; charset=utf-8",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "webmanifest" => "application/manifest+json",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "webp" => "image/webp",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}
