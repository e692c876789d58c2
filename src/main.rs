//! Pariksha - An exam-preparation platform

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pariksha::{
    api::{self, AppState},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{
            SqlxAttemptRepository, SqlxContentRepository, SqlxHeroRepository,
            SqlxQuestionRepository, SqlxQuizRepository, SqlxSessionRepository, SqlxUserRepository,
        },
    },
    services::{
        content::ContentService, oauth::GoogleOAuthClient, question::QuestionService,
        quiz::QuizService, user::UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pariksha=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Pariksha exam platform...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Initialize cache
    let cache = create_cache(&config.cache).await?;
    tracing::info!("Cache initialized");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let question_repo = SqlxQuestionRepository::boxed(pool.clone());
    let quiz_repo = SqlxQuizRepository::boxed(pool.clone());
    let attempt_repo = SqlxAttemptRepository::boxed(pool.clone());
    let content_repo = SqlxContentRepository::boxed(pool.clone());
    let hero_repo = SqlxHeroRepository::boxed(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::with_session_expiration(
        user_repo,
        session_repo,
        config.oauth.session_days,
    ));
    let question_service = Arc::new(QuestionService::new(question_repo.clone()));
    let quiz_service = Arc::new(QuizService::new(quiz_repo, question_repo, attempt_repo));
    let content_service = Arc::new(ContentService::with_cache_ttl(
        content_repo,
        hero_repo,
        cache.clone(),
        config.upload.path.clone(),
        Duration::from_secs(config.cache.ttl_seconds),
    ));

    // Google OAuth is optional; without credentials sign-in redirects home
    // with an error instead of panicking
    let oauth_client = if config.oauth.is_configured() {
        Some(Arc::new(GoogleOAuthClient::new(&config.oauth)?))
    } else {
        tracing::warn!("Google OAuth credentials not configured; sign-in is disabled");
        None
    };

    // Load embedded page templates
    let templates = Arc::new(api::pages::build_templates()?);
    tracing::info!("Templates loaded");

    // Build application state
    let state = AppState {
        pool: pool.clone(),
        user_service: user_service.clone(),
        quiz_service: quiz_service.clone(),
        question_service,
        content_service,
        oauth_client,
        upload_config: Arc::new(config.upload.clone()),
        templates,
        session_days: config.oauth.session_days,
    };

    // Background sweep: expired sessions and stale guest attempts
    // (runs every 5 minutes)
    {
        let user_service = user_service.clone();
        let quiz_service = quiz_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                match user_service.cleanup_expired_sessions().await {
                    Ok(n) if n > 0 => tracing::info!(deleted = n, "Swept expired sessions"),
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Session sweep failed: {}", e),
                }
                match quiz_service.cleanup_stale_guest_attempts().await {
                    Ok(n) if n > 0 => tracing::info!(deleted = n, "Swept stale guest attempts"),
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Guest attempt sweep failed: {}", e),
                }
            }
        });
    }

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
