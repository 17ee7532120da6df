//! Data models
//!
//! Structures shared across the site:
//! - Database entities (Project, Post)
//! - Directory records sourced from the code-hosting API (Repository, Contributor)
//! - The signed-in visitor (SessionIdentity)
//! - Form inputs

mod identity;
mod post;
mod project;
mod repository;

pub use identity::SessionIdentity;
pub use post::{CreatePostInput, Post};
pub use project::{Project, ProjectDetail, UpdateSummaryInput};
pub use repository::{Contributor, Repository, RepositorySummary};
