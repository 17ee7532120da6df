//! Project model

use serde::{Deserialize, Serialize};

use super::Post;

/// Editable content attached to a repository, keyed by repository name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub summary: String,
}

/// Everything the project page shows from the local store.
///
/// A repository without a project row yet has an empty summary and no posts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectDetail {
    pub summary: String,
    pub posts: Vec<Post>,
}

/// Form body for `POST /p/{name}/`
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateSummaryInput {
    #[serde(default)]
    pub summary: String,
}
