//! Directory records sourced from the code-hosting API
//!
//! These are never persisted locally; the directory service may cache them
//! for a bounded time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An account that has committed to a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub login: String,
    pub profile_url: String,
    /// Numeric account id on the hosting service
    pub id: i64,
}

/// A repository as shown in the organization listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositorySummary {
    pub name: String,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub source_url: String,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A single repository with its contributors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub description: Option<String>,
    pub website_url: Option<String>,
    pub source_url: String,
    pub contributors: Vec<Contributor>,
}
