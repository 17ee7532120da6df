//! Repository directory service
//!
//! Wraps a [`DirectoryClient`] with a bounded-lifetime cache. Page renders go
//! through the cache; anything that decides write access asks the directory
//! directly and stores the answer for the next reader.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheLayer, MemoryCache};
use crate::github::{DirectoryClient, DirectoryError, DirectoryResult};
use crate::models::{Repository, RepositorySummary};

pub struct DirectoryService {
    client: Arc<dyn DirectoryClient>,
    cache: Arc<MemoryCache>,
    organization: String,
    ttl: Duration,
}

impl DirectoryService {
    pub fn new(
        client: Arc<dyn DirectoryClient>,
        cache: Arc<MemoryCache>,
        organization: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        Self {
            client,
            cache,
            organization: organization.into(),
            ttl,
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    fn list_key(&self) -> String {
        format!("repos:{}", self.organization)
    }

    fn repo_key(&self, name: &str) -> String {
        format!("repo:{}:{}", self.organization, name)
    }

    /// All repositories of the organization, most recently updated first
    pub async fn list(&self) -> DirectoryResult<Vec<RepositorySummary>> {
        let key = self.list_key();
        if let Some(cached) = self.cached::<Vec<RepositorySummary>>(&key).await {
            tracing::debug!("Cache hit: {}", key);
            return Ok(cached);
        }

        tracing::debug!("Cache miss: {}", key);
        let repos = self.client.list_repositories(&self.organization).await?;
        self.store(&key, &repos).await;
        Ok(repos)
    }

    /// One repository, served from cache when available
    pub async fn get(&self, name: &str) -> DirectoryResult<Repository> {
        let key = self.repo_key(name);
        if let Some(cached) = self.cached::<Repository>(&key).await {
            tracing::debug!("Cache hit: {}", key);
            return Ok(cached);
        }

        tracing::debug!("Cache miss: {}", key);
        self.get_fresh(name).await
    }

    /// One repository straight from the directory; the cache is refreshed.
    ///
    /// A repository that has disappeared takes the whole cached directory
    /// with it, since the listing and entries under other spellings of its
    /// name are stale too.
    pub async fn get_fresh(&self, name: &str) -> DirectoryResult<Repository> {
        let repo = match self.client.get_repository(&self.organization, name).await {
            Ok(repo) => repo,
            Err(DirectoryError::NotFound(missing)) => {
                self.invalidate_all().await;
                return Err(DirectoryError::NotFound(missing));
            }
            Err(e) => return Err(e),
        };
        self.store(&self.repo_key(name), &repo).await;
        Ok(repo)
    }

    /// Forget the listing and every repository of the organization
    pub async fn invalidate_all(&self) {
        let pattern = format!("repo:{}:*", self.organization);
        let result = match self.cache.delete(&self.list_key()).await {
            Ok(()) => self.cache.delete_pattern(&pattern).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!("Failed to invalidate directory cache: {}", e);
        } else {
            tracing::debug!("Dropped cached directory of {}", self.organization);
        }
    }

    // Cache failures are logged and read as misses
    async fn cached<T: serde::de::DeserializeOwned + Send>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    async fn store<T: serde::Serialize + Send + Sync>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set(key, value, self.ttl).await {
            tracing::warn!("Failed to cache {}: {}", key, e);
        }
    }
}
