//! Site pages: the repository listing and the project page

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Redirect},
    routing::get,
    Form, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tera::Context as TeraContext;

use super::middleware::{ApiError, AppState};
use crate::auth::CurrentIdentity;
use crate::models::{Post, SessionIdentity, UpdateSummaryInput};
use crate::services::can_edit;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/p/{name}/", get(project).post(update_summary))
}

/// A post as the project page shows it
#[derive(Debug, Serialize)]
struct PostView {
    id: i64,
    name: String,
    body_html: String,
    created_on: DateTime<Utc>,
}

/// Path of the project page for `name`
pub fn project_path(name: &str) -> String {
    format!("/p/{}/", urlencoding::encode(name))
}

/// Variables every page template expects
fn page_context(state: &AppState, identity: Option<&SessionIdentity>) -> TeraContext {
    let mut context = TeraContext::new();
    context.insert("organization", state.directory.organization());
    context.insert("identity", &identity);
    context
}

pub fn render_error(
    state: &AppState,
    identity: Option<&SessionIdentity>,
    status: StatusCode,
    message: &str,
) -> anyhow::Result<String> {
    let mut context = page_context(state, identity);
    context.insert("status", &status.to_string());
    context.insert("message", message);
    state.theme_engine.render("error.html", &context)
}

/// GET / - every repository of the organization
pub async fn index(
    State(state): State<AppState>,
    identity: CurrentIdentity,
) -> Result<Html<String>, ApiError> {
    let repos = state.directory.list().await?;

    let mut context = page_context(&state, identity.identity());
    context.insert("repos", &repos);
    Ok(Html(state.theme_engine.render("index.html", &context)?))
}

/// GET /p/{name}/ - repository details, summary and blog
pub async fn project(
    State(state): State<AppState>,
    Path(name): Path<String>,
    identity: CurrentIdentity,
) -> Result<Html<String>, ApiError> {
    let repo = state.directory.get(&name).await?;
    let detail = state.project_service.detail(&repo.name).await?;

    // Only decides which forms to show; writes check again
    let is_editor = can_edit(identity.identity(), &repo.contributors);

    let posts: Vec<PostView> = detail
        .posts
        .into_iter()
        .map(|post: Post| PostView {
            id: post.id,
            body_html: state.markdown.render(&post.body),
            name: post.name,
            created_on: post.created_on,
        })
        .collect();

    let mut context = page_context(&state, identity.identity());
    context.insert("repo", &repo);
    context.insert("summary", &detail.summary);
    context.insert("posts", &posts);
    context.insert("is_editor", &is_editor);
    Ok(Html(state.theme_engine.render("project.html", &context)?))
}

/// POST /p/{name}/ - replace the summary, then back to the project page
pub async fn update_summary(
    State(state): State<AppState>,
    Path(name): Path<String>,
    identity: CurrentIdentity,
    Form(input): Form<UpdateSummaryInput>,
) -> Result<Redirect, ApiError> {
    state
        .project_service
        .update_summary(identity.identity(), &name, &input.summary)
        .await?;
    Ok(Redirect::to(&project_path(&name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_path_encodes_name() {
        assert_eq!(project_path("website"), "/p/website/");
        assert_eq!(project_path("a b"), "/p/a%20b/");
    }
}
