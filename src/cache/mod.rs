//! Cache layer
//!
//! In-process cache (moka) for data fetched from the repository directory.
//! Entries carry their own time-to-live and can be dropped explicitly by key
//! or glob pattern.
//!
//! # Usage
//!
//! ```rust,ignore
//! use codeguild::cache::{create_cache, CacheLayer};
//! use codeguild::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set("repos:CodeGuild-co", &repos, Duration::from_secs(300)).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// The generic methods make this trait unusable as `dyn CacheLayer`;
/// consumers hold the concrete cache behind an `Arc`.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;
}

/// Build the shared cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<MemoryCache> {
    tracing::debug!("Using in-memory cache (capacity {})", config.max_capacity);
    Arc::new(MemoryCache::with_capacity(config.max_capacity))
}
