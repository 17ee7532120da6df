//! Blog post model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blog post belonging to a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub body: String,
    pub created_on: DateTime<Utc>,
}

/// Form body for `POST /p/{name}/blog/`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub body: String,
}

impl CreatePostInput {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }

    /// A post needs a title; the body may be empty.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty()
    }
}
