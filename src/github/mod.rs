//! Source-control directory client
//!
//! Reads an organization's repositories and a repository's contributors from
//! the GitHub REST API. Nothing fetched here is persisted; caching is the
//! caller's business (see `services::directory`).

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use crate::config::GitHubConfig;
use crate::models::{Contributor, Repository, RepositorySummary};

/// Page size requested from list endpoints; a shorter page is the last one
const PAGE_SIZE: usize = 100;

/// Stop following pages after this many, whatever the API says
const MAX_PAGES: u32 = 50;

const USER_AGENT: &str = concat!("codeguild/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Repository '{0}' not found")]
    NotFound(String),
    #[error("Directory request failed: {0:#}")]
    Upstream(#[from] anyhow::Error),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Read access to an organization's repositories
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// All repositories of `org`, most recently updated first
    async fn list_repositories(&self, org: &str) -> DirectoryResult<Vec<RepositorySummary>>;

    /// One repository with its full contributor list
    async fn get_repository(&self, org: &str, name: &str) -> DirectoryResult<Repository>;
}

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    name: String,
    description: Option<String>,
    homepage: Option<String>,
    html_url: String,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GitHubContributor {
    login: String,
    html_url: String,
    id: i64,
}

impl From<GitHubRepo> for RepositorySummary {
    fn from(r: GitHubRepo) -> Self {
        Self {
            name: r.name,
            description: r.description.filter(|d| !d.is_empty()),
            website_url: r.homepage.filter(|h| !h.is_empty()),
            source_url: r.html_url,
            updated_at: r.updated_at,
        }
    }
}

impl From<GitHubContributor> for Contributor {
    fn from(c: GitHubContributor) -> Self {
        Self {
            login: c.login,
            profile_url: c.html_url,
            id: c.id,
        }
    }
}

/// Directory client backed by the GitHub REST API
pub struct GitHubClient {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
    max_pages: u32,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build GitHub HTTP client")?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone().filter(|t| !t.is_empty()),
            max_pages: MAX_PAGES,
        })
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Fetch one JSON document; `Ok(None)` when the API answers 404
    async fn fetch<T: serde::de::DeserializeOwned>(&self, url: &str) -> anyhow::Result<Option<T>> {
        let response = self
            .request(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            // An empty repository has no contributor statistics yet
            StatusCode::NO_CONTENT => Ok(Some(
                serde_json::from_str("[]").context("Failed to build empty page")?,
            )),
            status if status.is_success() => {
                let body = response
                    .json::<T>()
                    .await
                    .with_context(|| format!("Failed to parse response from {}", url))?;
                Ok(Some(body))
            }
            status => anyhow::bail!("GitHub returned {} for {}", status, url),
        }
    }

    /// Walk a paginated list endpoint until a short page
    async fn fetch_all<T: serde::de::DeserializeOwned>(&self, base_url: &str) -> anyhow::Result<Option<Vec<T>>> {
        let separator = if base_url.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();

        for page in 1..=self.max_pages {
            let url = format!("{}{}per_page={}&page={}", base_url, separator, PAGE_SIZE, page);
            let batch: Vec<T> = match self.fetch(&url).await? {
                Some(batch) => batch,
                None if page == 1 => return Ok(None),
                None => return Ok(Some(items)),
            };
            let last = batch.len() < PAGE_SIZE;
            items.extend(batch);
            if last {
                return Ok(Some(items));
            }
        }

        tracing::warn!(
            "Stopped after {} pages of {}; the list may be incomplete",
            self.max_pages,
            base_url
        );
        Ok(Some(items))
    }
}

#[async_trait]
impl DirectoryClient for GitHubClient {
    async fn list_repositories(&self, org: &str) -> DirectoryResult<Vec<RepositorySummary>> {
        let url = format!(
            "{}/orgs/{}/repos?sort=updated&direction=desc",
            self.api_url,
            urlencoding::encode(org)
        );
        let repos: Vec<GitHubRepo> = self
            .fetch_all(&url)
            .await?
            .ok_or_else(|| DirectoryError::NotFound(org.to_string()))?;

        let mut summaries: Vec<RepositorySummary> = repos.into_iter().map(Into::into).collect();
        sort_by_recent_update(&mut summaries);
        tracing::debug!("Fetched {} repositories for {}", summaries.len(), org);
        Ok(summaries)
    }

    async fn get_repository(&self, org: &str, name: &str) -> DirectoryResult<Repository> {
        let repo_path = format!(
            "{}/repos/{}/{}",
            self.api_url,
            urlencoding::encode(org),
            urlencoding::encode(name)
        );

        let repo: GitHubRepo = self
            .fetch(&repo_path)
            .await?
            .ok_or_else(|| DirectoryError::NotFound(name.to_string()))?;

        let contributors: Vec<GitHubContributor> = self
            .fetch_all(&format!("{}/contributors", repo_path))
            .await?
            .unwrap_or_default();

        let summary = RepositorySummary::from(repo);
        Ok(Repository {
            name: summary.name,
            description: summary.description,
            website_url: summary.website_url,
            source_url: summary.source_url,
            contributors: contributors.into_iter().map(Into::into).collect(),
        })
    }
}

/// Most recently updated first; repositories without a timestamp go last
pub fn sort_by_recent_update(repos: &mut [RepositorySummary]) {
    repos.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}
