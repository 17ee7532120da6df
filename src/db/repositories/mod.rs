//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for a single table.

pub mod post;
pub mod project;

pub use post::{PostRepository, SqlxPostRepository};
pub use project::{ProjectRepository, SqlxProjectRepository};
