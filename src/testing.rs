//! In-process fakes shared by unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::auth::{AuthError, IdentityProvider};
use crate::cache::MemoryCache;
use crate::db::repositories::{SqlxPostRepository, SqlxProjectRepository};
use crate::db::{create_test_pool, migrations, DynDatabasePool};
use crate::github::{DirectoryClient, DirectoryError, DirectoryResult};
use crate::models::{Contributor, Repository, RepositorySummary, SessionIdentity};
use crate::services::{DirectoryService, ProjectService};

pub const ORG: &str = "CodeGuild-co";

/// Directory with repositories defined by the test
#[derive(Default)]
pub struct FakeDirectory {
    repos: Mutex<HashMap<String, Repository>>,
    fail: Mutex<bool>,
    get_calls: AtomicUsize,
}

impl FakeDirectory {
    pub fn with_repo(name: &str, contributor_ids: &[i64]) -> Arc<Self> {
        let directory = Arc::new(Self::default());
        directory.put_repo(name, contributor_ids);
        directory
    }

    pub fn put_repo(&self, name: &str, contributor_ids: &[i64]) {
        let repo = Repository {
            name: name.to_string(),
            description: Some(format!("The {} project", name)),
            website_url: None,
            source_url: format!("https://github.com/{}/{}", ORG, name),
            contributors: contributor_ids
                .iter()
                .map(|&id| Contributor {
                    login: format!("user{}", id),
                    profile_url: format!("https://github.com/user{}", id),
                    id,
                })
                .collect(),
        };
        self.repos.lock().unwrap().insert(name.to_string(), repo);
    }

    /// Make every call fail as if the API were unreachable
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    fn check_up(&self) -> DirectoryResult<()> {
        if *self.fail.lock().unwrap() {
            return Err(DirectoryError::Upstream(anyhow::anyhow!("directory unavailable")));
        }
        Ok(())
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn list_repositories(&self, _org: &str) -> DirectoryResult<Vec<RepositorySummary>> {
        self.check_up()?;
        let mut repos: Vec<RepositorySummary> = self
            .repos
            .lock()
            .unwrap()
            .values()
            .map(|r| RepositorySummary {
                name: r.name.clone(),
                description: r.description.clone(),
                website_url: r.website_url.clone(),
                source_url: r.source_url.clone(),
                updated_at: None,
            })
            .collect();
        repos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(repos)
    }

    async fn get_repository(&self, _org: &str, name: &str) -> DirectoryResult<Repository> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_up()?;
        // Names resolve case-insensitively, as on GitHub
        self.repos
            .lock()
            .unwrap()
            .values()
            .find(|repo| repo.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(name.to_string()))
    }
}

/// Identity provider that signs in whoever the code names: code `github|42`
/// yields identity `github|42`; code `bad` fails.
pub struct FakeIdentityProvider;

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn authorize_url(&self, state: &str, redirect_uri: &str) -> String {
        format!(
            "https://id.example/authorize?state={}&redirect_uri={}",
            urlencoding::encode(state),
            urlencoding::encode(redirect_uri)
        )
    }

    async fn authenticate(&self, code: &str, _redirect_uri: &str) -> Result<SessionIdentity, AuthError> {
        if code == "bad" {
            return Err(AuthError::Denied("invalid code".to_string()));
        }
        Ok(SessionIdentity::new(code, "Tester", "https://avatars.example/t"))
    }

    fn logout_url(&self, return_to: &str) -> String {
        format!("https://id.example/v2/logout?returnTo={}", urlencoding::encode(return_to))
    }
}

pub fn identity(sub: &str) -> SessionIdentity {
    SessionIdentity::new(sub, "Tester", "")
}

pub async fn test_pool() -> DynDatabasePool {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

pub fn directory_service(client: Arc<FakeDirectory>) -> Arc<DirectoryService> {
    Arc::new(DirectoryService::new(
        client,
        Arc::new(MemoryCache::new()),
        ORG,
        Duration::from_secs(300),
    ))
}

pub fn project_service(pool: &DynDatabasePool, directory: Arc<DirectoryService>) -> ProjectService {
    ProjectService::new(
        SqlxProjectRepository::boxed(pool.clone()),
        SqlxPostRepository::boxed(pool.clone()),
        directory,
    )
}
