//! Project service
//!
//! Reads and writes the locally stored side of a project: its summary and blog
//! posts. Every write first checks, against a contributor list fetched for that
//! request, that the signed-in visitor contributes to the repository. A refused
//! write is not an error; callers get `false`/`None` back and carry on.

use std::sync::Arc;

use crate::db::repositories::{PostRepository, ProjectRepository};
use crate::github::DirectoryError;
use crate::models::{CreatePostInput, Post, ProjectDetail, Repository, SessionIdentity};
use crate::services::access::can_edit;
use crate::services::directory::DirectoryService;

#[derive(Debug, thiserror::Error)]
pub enum ProjectServiceError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("Internal error: {0:#}")]
    InternalError(#[from] anyhow::Error),
}

pub type ProjectResult<T> = Result<T, ProjectServiceError>;

pub struct ProjectService {
    projects: Arc<dyn ProjectRepository>,
    posts: Arc<dyn PostRepository>,
    directory: Arc<DirectoryService>,
}

impl ProjectService {
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        posts: Arc<dyn PostRepository>,
        directory: Arc<DirectoryService>,
    ) -> Self {
        Self {
            projects,
            posts,
            directory,
        }
    }

    /// Summary and posts for `name`; empty when nothing has been written yet
    pub async fn detail(&self, name: &str) -> ProjectResult<ProjectDetail> {
        let Some(project) = self.projects.get_by_name(name).await? else {
            return Ok(ProjectDetail::default());
        };
        let posts = self.posts.list_by_project(project.id).await?;
        Ok(ProjectDetail {
            summary: project.summary,
            posts,
        })
    }

    /// The repository behind `name` when `identity` may write to it right now.
    ///
    /// The contributor list is fetched from the directory on every call.
    /// Writes are keyed on the returned repository's name, which the
    /// directory spells canonically even when `name` differs in case.
    async fn editable_repository(
        &self,
        identity: Option<&SessionIdentity>,
        name: &str,
    ) -> ProjectResult<Option<Repository>> {
        let Some(identity) = identity else {
            return Ok(None);
        };

        let repo = match self.directory.get_fresh(name).await {
            Ok(repo) => repo,
            Err(DirectoryError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if !can_edit(Some(identity), &repo.contributors) {
            tracing::warn!(
                "Refused write to '{}' by {}",
                repo.name,
                identity.external_user_id
            );
            return Ok(None);
        }
        Ok(Some(repo))
    }

    /// Replace the summary; returns whether the write happened
    pub async fn update_summary(
        &self,
        identity: Option<&SessionIdentity>,
        name: &str,
        summary: &str,
    ) -> ProjectResult<bool> {
        let Some(repo) = self.editable_repository(identity, name).await? else {
            return Ok(false);
        };
        self.projects.upsert_summary(&repo.name, summary).await?;
        tracing::info!("Updated summary of '{}'", repo.name);
        Ok(true)
    }

    /// Add a post, creating the project row if this is its first content
    pub async fn create_post(
        &self,
        identity: Option<&SessionIdentity>,
        name: &str,
        input: &CreatePostInput,
    ) -> ProjectResult<Option<Post>> {
        let Some(repo) = self.editable_repository(identity, name).await? else {
            return Ok(None);
        };
        if !input.is_valid() {
            tracing::debug!("Ignoring post without a title for '{}'", repo.name);
            return Ok(None);
        }

        let project = self.projects.ensure(&repo.name).await?;
        let post = self.posts.create(project.id, input).await?;
        tracing::info!("Created post {} on '{}'", post.id, repo.name);
        Ok(Some(post))
    }

    /// Remove a post of this project; returns whether one was removed
    pub async fn delete_post(
        &self,
        identity: Option<&SessionIdentity>,
        name: &str,
        post_id: i64,
    ) -> ProjectResult<bool> {
        let Some(repo) = self.editable_repository(identity, name).await? else {
            return Ok(false);
        };
        let Some(project) = self.projects.get_by_name(&repo.name).await? else {
            return Ok(false);
        };

        let deleted = self.posts.delete(project.id, post_id).await?;
        if deleted {
            tracing::info!("Deleted post {} from '{}'", post_id, repo.name);
        }
        Ok(deleted)
    }
}
