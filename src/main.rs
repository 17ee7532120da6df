//! CodeGuild - the organization project site

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codeguild::{
    api::{self, AppState},
    auth::{Auth0Provider, SessionCodec},
    cache::create_cache,
    config::Config,
    db::{
        self,
        repositories::{SqlxPostRepository, SqlxProjectRepository},
    },
    github::GitHubClient,
    services::{DirectoryService, MarkdownRenderer, ProjectService},
    theme::ThemeEngine,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "codeguild=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CodeGuild site...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    config.validate()?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Directory access, cached
    let cache = create_cache(&config.cache);
    let github = Arc::new(GitHubClient::new(&config.github)?);
    let directory = Arc::new(DirectoryService::new(
        github,
        cache,
        config.github.organization.clone(),
        config.cache.directory_ttl(),
    ));
    tracing::info!(
        "Listing repositories of {} (cached for {}s)",
        config.github.organization,
        config.cache.directory_ttl_seconds
    );

    // Create repositories and services
    let project_service = Arc::new(ProjectService::new(
        SqlxProjectRepository::boxed(pool.clone()),
        SqlxPostRepository::boxed(pool.clone()),
        directory.clone(),
    ));

    let identity_provider = Arc::new(Auth0Provider::new(&config.auth)?);

    // Initialize theme engine
    let theme_engine = ThemeEngine::new(config.theme.path.as_deref())
        .context("Failed to initialize templates")?;
    match &config.theme.path {
        Some(path) => tracing::info!("Templates loaded with overrides from {:?}", path),
        None => tracing::info!("Templates loaded"),
    }

    let state = AppState {
        pool: pool.clone(),
        directory,
        project_service,
        identity_provider,
        sessions: SessionCodec::new(&config.session),
        theme_engine: Arc::new(theme_engine),
        markdown: MarkdownRenderer::new(),
        server: Arc::new(config.server.clone()),
    };

    // Build router
    let app = api::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    pool.close().await;
    Ok(())
}
