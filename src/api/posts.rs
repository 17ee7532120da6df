//! Blog post writes

use axum::{
    extract::{Path, State},
    response::Redirect,
    routing::post,
    Form, Router,
};

use super::middleware::{ApiError, AppState};
use super::pages::project_path;
use crate::auth::CurrentIdentity;
use crate::models::CreatePostInput;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/p/{name}/blog/", post(create_post))
        .route("/p/{name}/blog/{id}/delete/", post(delete_post))
}

/// POST /p/{name}/blog/ - publish a post
pub async fn create_post(
    State(state): State<AppState>,
    Path(name): Path<String>,
    identity: CurrentIdentity,
    Form(input): Form<CreatePostInput>,
) -> Result<Redirect, ApiError> {
    state
        .project_service
        .create_post(identity.identity(), &name, &input)
        .await?;
    Ok(Redirect::to(&project_path(&name)))
}

/// POST /p/{name}/blog/{id}/delete/ - remove a post
pub async fn delete_post(
    State(state): State<AppState>,
    Path((name, post_id)): Path<(String, i64)>,
    identity: CurrentIdentity,
) -> Result<Redirect, ApiError> {
    state
        .project_service
        .delete_post(identity.identity(), &name, post_id)
        .await?;
    Ok(Redirect::to(&project_path(&name)))
}
