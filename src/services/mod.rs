//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories/directory
//! client. They own the rules: who may write, how the directory cache is used,
//! and what an absent project looks like.

pub mod access;
pub mod directory;
pub mod markdown;
pub mod project;

pub use access::{can_edit, parse_account_id};
pub use directory::DirectoryService;
pub use markdown::MarkdownRenderer;
pub use project::{ProjectResult, ProjectService, ProjectServiceError};
