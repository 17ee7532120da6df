//! Shared HTTP plumbing
//!
//! Contains:
//! - `AppState`, the services handed to every handler
//! - `ApiError`, the error type handlers return
//! - the middleware that turns an `ApiError` into a themed error page

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

use crate::auth::{AuthError, CurrentIdentity, IdentityProvider, SessionCodec};
use crate::config::ServerConfig;
use crate::db::DynDatabasePool;
use crate::github::DirectoryError;
use crate::services::{DirectoryService, MarkdownRenderer, ProjectService, ProjectServiceError};
use crate::theme::ThemeEngine;

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub directory: Arc<DirectoryService>,
    pub project_service: Arc<ProjectService>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub sessions: SessionCodec,
    pub theme_engine: Arc<ThemeEngine>,
    pub markdown: MarkdownRenderer,
    pub server: Arc<ServerConfig>,
}

/// Error returned by handlers; shown to the visitor as an error page
#[derive(Debug, Clone)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new("BAD_GATEWAY", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "BAD_REQUEST" => StatusCode::BAD_REQUEST,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "BAD_GATEWAY" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}: {}", self.code, self.message);
        }

        // Plain page; `render_error_pages` swaps in the themed one
        let body = format!(
            "<!DOCTYPE html><title>{status}</title><h1>{status}</h1><p>{}</p>",
            tera::escape_html(&self.message)
        );
        let mut response = (status, Html(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

impl From<DirectoryError> for ApiError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::NotFound(name) => Self::not_found(format!("No repository named '{}'", name)),
            DirectoryError::Upstream(e) => {
                tracing::error!("Directory request failed: {:#}", e);
                Self::bad_gateway("GitHub could not be reached, please try again later")
            }
        }
    }
}

impl From<ProjectServiceError> for ApiError {
    fn from(e: ProjectServiceError) -> Self {
        match e {
            ProjectServiceError::Directory(e) => e.into(),
            ProjectServiceError::InternalError(e) => e.into(),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::StateMismatch | AuthError::MissingCode | AuthError::Denied(_) => {
                tracing::warn!("Sign-in rejected: {}", e);
                Self::bad_request(e.to_string())
            }
            AuthError::Provider(e) => {
                tracing::error!("Identity provider failed: {:#}", e);
                Self::bad_gateway("Sign-in failed, please try again later")
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        Self::internal_error(format!("{:#}", e))
    }
}

/// Replace the plain body of an `ApiError` response with `error.html`
pub async fn render_error_pages(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let identity = request
        .extensions()
        .get::<CurrentIdentity>()
        .cloned()
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let Some(error) = response.extensions_mut().remove::<ApiError>() else {
        return response;
    };

    let status = response.status();
    // Internal details stay in the log
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "Something went wrong on our side."
    } else {
        error.message.as_str()
    };

    match super::pages::render_error(&state, identity.identity(), status, message) {
        Ok(html) => {
            let mut themed = (status, Html(html)).into_response();
            for cookie in response.headers().get_all(header::SET_COOKIE) {
                themed.headers_mut().append(header::SET_COOKIE, cookie.clone());
            }
            themed
        }
        Err(e) => {
            tracing::error!("Failed to render error page: {:#}", e);
            response
        }
    }
}
