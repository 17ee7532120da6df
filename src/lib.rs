//! CodeGuild - the organization project site
//!
//! Lists the organization's GitHub repositories and lets each repository's
//! contributors keep a project summary and a small blog on the site.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod github;
pub mod models;
pub mod services;
pub mod theme;

#[cfg(test)]
mod testing;
