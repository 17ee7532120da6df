//! Blog post repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::{CreatePostInput, Post};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// All posts of a project in creation order
    async fn list_by_project(&self, project_id: i64) -> Result<Vec<Post>>;

    async fn create(&self, project_id: i64, input: &CreatePostInput) -> Result<Post>;

    /// Delete a post if it belongs to the project; returns whether a row was removed
    async fn delete(&self, project_id: i64, post_id: i64) -> Result<bool>;
}

pub struct SqlxPostRepository {
    pool: DynDatabasePool,
}

impl SqlxPostRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn PostRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepository {
    async fn list_by_project(&self, project_id: i64) -> Result<Vec<Post>> {
        match self.pool.backend()? {
            Backend::Sqlite(pool) => list_by_project_sqlite(pool, project_id).await,
            Backend::Mysql(pool) => list_by_project_mysql(pool, project_id).await,
        }
    }

    async fn create(&self, project_id: i64, input: &CreatePostInput) -> Result<Post> {
        match self.pool.backend()? {
            Backend::Sqlite(pool) => create_sqlite(pool, project_id, input).await,
            Backend::Mysql(pool) => create_mysql(pool, project_id, input).await,
        }
    }

    async fn delete(&self, project_id: i64, post_id: i64) -> Result<bool> {
        const SQL: &str = "DELETE FROM blog WHERE id = ? AND project_id = ?";
        let affected = match self.pool.backend()? {
            Backend::Sqlite(pool) => sqlx::query(SQL)
                .bind(post_id)
                .bind(project_id)
                .execute(pool)
                .await
                .context("Failed to delete post")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(SQL)
                .bind(post_id)
                .bind(project_id)
                .execute(pool)
                .await
                .context("Failed to delete post")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }
}

const LIST_SQL: &str = "SELECT id, project_id, name, body, created_on FROM blog \
                        WHERE project_id = ? ORDER BY created_on ASC, id ASC";

// SQLite implementations
async fn list_by_project_sqlite(pool: &SqlitePool, project_id: i64) -> Result<Vec<Post>> {
    let rows = sqlx::query(LIST_SQL)
        .bind(project_id)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;
    Ok(rows.iter().map(row_to_post_sqlite).collect())
}

async fn create_sqlite(pool: &SqlitePool, project_id: i64, input: &CreatePostInput) -> Result<Post> {
    let now = Utc::now();
    let result = sqlx::query("INSERT INTO blog (project_id, name, body, created_on) VALUES (?, ?, ?, ?)")
        .bind(project_id)
        .bind(&input.name)
        .bind(&input.body)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_rowid(),
        project_id,
        name: input.name.clone(),
        body: input.body.clone(),
        created_on: now,
    })
}

fn row_to_post_sqlite(row: &sqlx::sqlite::SqliteRow) -> Post {
    Post {
        id: row.get("id"),
        project_id: row.get("project_id"),
        name: row.get("name"),
        body: row.get("body"),
        created_on: row.get("created_on"),
    }
}

// MySQL implementations
async fn list_by_project_mysql(pool: &MySqlPool, project_id: i64) -> Result<Vec<Post>> {
    let rows = sqlx::query(LIST_SQL)
        .bind(project_id)
        .fetch_all(pool)
        .await
        .context("Failed to list posts")?;
    Ok(rows.iter().map(row_to_post_mysql).collect())
}

async fn create_mysql(pool: &MySqlPool, project_id: i64, input: &CreatePostInput) -> Result<Post> {
    let now = Utc::now();
    let result = sqlx::query("INSERT INTO blog (project_id, name, body, created_on) VALUES (?, ?, ?, ?)")
        .bind(project_id)
        .bind(&input.name)
        .bind(&input.body)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_id() as i64,
        project_id,
        name: input.name.clone(),
        body: input.body.clone(),
        created_on: now,
    })
}

fn row_to_post_mysql(row: &sqlx::mysql::MySqlRow) -> Post {
    Post {
        id: row.get("id"),
        project_id: row.get("project_id"),
        name: row.get("name"),
        body: row.get("body"),
        created_on: row.get("created_on"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{ProjectRepository, SqlxProjectRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> (SqlxProjectRepository, SqlxPostRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        (
            SqlxProjectRepository::new(pool.clone()),
            SqlxPostRepository::new(pool),
        )
    }

    #[tokio::test]
    async fn test_list_empty() {
        let (projects, posts) = setup().await;
        let project = projects.ensure("foo").await.unwrap();

        assert!(posts.list_by_project(project.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_and_list_in_creation_order() {
        let (projects, posts) = setup().await;
        let project = projects.ensure("foo").await.unwrap();

        let first = posts
            .create(project.id, &CreatePostInput::new("First", "one"))
            .await
            .unwrap();
        let second = posts
            .create(project.id, &CreatePostInput::new("Second", "two"))
            .await
            .unwrap();

        let listed = posts.list_by_project(project.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[0].name, "First");
        assert_eq!(listed[0].body, "one");
        assert_eq!(listed[1].id, second.id);
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_project() {
        let (projects, posts) = setup().await;
        let foo = projects.ensure("foo").await.unwrap();
        let bar = projects.ensure("bar").await.unwrap();

        posts.create(foo.id, &CreatePostInput::new("Foo post", "")).await.unwrap();

        assert_eq!(posts.list_by_project(foo.id).await.unwrap().len(), 1);
        assert!(posts.list_by_project(bar.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_post() {
        let (projects, posts) = setup().await;
        let project = projects.ensure("foo").await.unwrap();
        let post = posts
            .create(project.id, &CreatePostInput::new("Gone soon", ""))
            .await
            .unwrap();

        assert!(posts.delete(project.id, post.id).await.unwrap());
        assert!(posts.list_by_project(project.id).await.unwrap().is_empty());
        assert!(!posts.delete(project.id, post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_ignores_post_of_other_project() {
        let (projects, posts) = setup().await;
        let foo = projects.ensure("foo").await.unwrap();
        let bar = projects.ensure("bar").await.unwrap();
        let post = posts.create(foo.id, &CreatePostInput::new("Mine", "")).await.unwrap();

        assert!(!posts.delete(bar.id, post.id).await.unwrap());
        assert_eq!(posts.list_by_project(foo.id).await.unwrap().len(), 1);
    }
}
