//! Project repository
//!
//! One row per repository name. Writes use insert-then-update: the insert is
//! attempted first and, when it hits the unique constraint on `name`, that
//! transaction is abandoned and the change is applied as an update in a fresh
//! one. Concurrent first edits therefore converge on a single row.

use crate::db::{is_unique_violation, Backend, DynDatabasePool};
use crate::models::Project;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Find a project by repository name
    async fn get_by_name(&self, name: &str) -> Result<Option<Project>>;

    /// Set the summary, creating the row when missing
    async fn upsert_summary(&self, name: &str, summary: &str) -> Result<Project>;

    /// Return the row for `name`, creating it with an empty summary if needed
    async fn ensure(&self, name: &str) -> Result<Project>;
}

pub struct SqlxProjectRepository {
    pool: DynDatabasePool,
}

impl SqlxProjectRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ProjectRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ProjectRepository for SqlxProjectRepository {
    async fn get_by_name(&self, name: &str) -> Result<Option<Project>> {
        match self.pool.backend()? {
            Backend::Sqlite(pool) => get_by_name_sqlite(pool, name).await,
            Backend::Mysql(pool) => get_by_name_mysql(pool, name).await,
        }
    }

    async fn upsert_summary(&self, name: &str, summary: &str) -> Result<Project> {
        match self.pool.backend()? {
            Backend::Sqlite(pool) => upsert_summary_sqlite(pool, name, summary).await,
            Backend::Mysql(pool) => upsert_summary_mysql(pool, name, summary).await,
        }
    }

    async fn ensure(&self, name: &str) -> Result<Project> {
        if let Some(project) = self.get_by_name(name).await? {
            return Ok(project);
        }
        match self.pool.backend()? {
            Backend::Sqlite(pool) => ensure_sqlite(pool, name).await,
            Backend::Mysql(pool) => ensure_mysql(pool, name).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn get_by_name_sqlite(pool: &SqlitePool, name: &str) -> Result<Option<Project>> {
    let row = sqlx::query("SELECT id, name, summary FROM project WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get project")?;
    Ok(row.map(|r| Project {
        id: r.get("id"),
        name: r.get("name"),
        summary: r.get("summary"),
    }))
}

async fn upsert_summary_sqlite(pool: &SqlitePool, name: &str, summary: &str) -> Result<Project> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let inserted = sqlx::query("INSERT INTO project (name, summary) VALUES (?, ?)")
        .bind(name)
        .bind(summary)
        .execute(&mut *tx)
        .await;

    match inserted {
        Ok(_) => tx.commit().await.context("Failed to commit project insert")?,
        Err(e) if is_unique_violation(&e) => {
            tx.rollback().await.context("Failed to roll back project insert")?;
            tracing::debug!("Project '{}' exists, updating summary", name);

            let mut tx = pool.begin().await.context("Failed to begin transaction")?;
            sqlx::query("UPDATE project SET summary = ? WHERE name = ?")
                .bind(summary)
                .bind(name)
                .execute(&mut *tx)
                .await
                .context("Failed to update project summary")?;
            tx.commit().await.context("Failed to commit project update")?;
        }
        Err(e) => return Err(e).context("Failed to insert project"),
    }

    get_by_name_sqlite(pool, name)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Project '{}' not found after upsert", name))
}

async fn ensure_sqlite(pool: &SqlitePool, name: &str) -> Result<Project> {
    let inserted = sqlx::query("INSERT INTO project (name, summary) VALUES (?, '')")
        .bind(name)
        .execute(pool)
        .await;

    match inserted {
        Ok(_) => {}
        // Lost a creation race; the winner's row is what we want
        Err(e) if is_unique_violation(&e) => {}
        Err(e) => return Err(e).context("Failed to create project"),
    }

    get_by_name_sqlite(pool, name)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Project '{}' not found after insert", name))
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn get_by_name_mysql(pool: &MySqlPool, name: &str) -> Result<Option<Project>> {
    let row = sqlx::query("SELECT id, name, summary FROM project WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await
        .context("Failed to get project")?;
    Ok(row.map(|r| Project {
        id: r.get("id"),
        name: r.get("name"),
        summary: r.get("summary"),
    }))
}

async fn upsert_summary_mysql(pool: &MySqlPool, name: &str, summary: &str) -> Result<Project> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;
    let inserted = sqlx::query("INSERT INTO project (name, summary) VALUES (?, ?)")
        .bind(name)
        .bind(summary)
        .execute(&mut *tx)
        .await;

    match inserted {
        Ok(_) => tx.commit().await.context("Failed to commit project insert")?,
        Err(e) if is_unique_violation(&e) => {
            tx.rollback().await.context("Failed to roll back project insert")?;
            tracing::debug!("Project '{}' exists, updating summary", name);

            let mut tx = pool.begin().await.context("Failed to begin transaction")?;
            sqlx::query("UPDATE project SET summary = ? WHERE name = ?")
                .bind(summary)
                .bind(name)
                .execute(&mut *tx)
                .await
                .context("Failed to update project summary")?;
            tx.commit().await.context("Failed to commit project update")?;
        }
        Err(e) => return Err(e).context("Failed to insert project"),
    }

    get_by_name_mysql(pool, name)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Project '{}' not found after upsert", name))
}

async fn ensure_mysql(pool: &MySqlPool, name: &str) -> Result<Project> {
    let inserted = sqlx::query("INSERT INTO project (name, summary) VALUES (?, '')")
        .bind(name)
        .execute(pool)
        .await;

    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {}
        Err(e) => return Err(e).context("Failed to create project"),
    }

    get_by_name_mysql(pool, name)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Project '{}' not found after insert", name))
}
