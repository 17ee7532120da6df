//! HTTP layer - handlers and routing
//!
//! - `pages`: the repository listing, project pages and summary edits
//! - `posts`: blog post creation and deletion
//! - `auth`: sign-in, the sign-in callback and sign-out
//! - `middleware`: shared state, the error type and error page rendering

pub mod auth;
pub mod middleware;
pub mod pages;
pub mod posts;


use axum::{
    extract::State,
    http::StatusCode,
    middleware as axum_middleware,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

pub use middleware::{ApiError, AppState};

/// GET /healthz - the database answers
async fn healthz(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.pool.ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!("Health check failed: {:#}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "database unavailable")
        }
    }
}

async fn not_found() -> ApiError {
    ApiError::not_found("This page does not exist")
}

/// Build the complete router with middleware
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(pages::router())
        .merge(posts::router())
        .merge(auth::router())
        .route("/healthz", get(healthz))
        .fallback(not_found)
        // Runs inside `load_identity` so error pages know who is signed in
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::render_error_pages,
        ))
        .layer(axum_middleware::from_fn_with_state(
            state.sessions.clone(),
            crate::auth::load_identity,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
