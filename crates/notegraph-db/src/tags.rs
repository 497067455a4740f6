//! Tag repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::debug;

use notegraph_core::{
    DeletedTagSummary, EntityKind, Error, ResourceRepository, Result, Tag, TagRepository,
};

use crate::map_write_error;

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceRepository<Tag> for PgTagRepository {
    async fn list(&self) -> Result<Vec<Tag>> {
        sqlx::query_as::<_, Tag>("SELECT id, title FROM tag ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn get(&self, id: i64) -> Result<Option<Tag>> {
        sqlx::query_as::<_, Tag>("SELECT id, title FROM tag WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tag WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn create(&self, title: &str) -> Result<Tag> {
        let tag = sqlx::query_as::<_, Tag>("INSERT INTO tag (title) VALUES ($1) RETURNING id, title")
            .bind(title)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;

        debug!(subsystem = "db", component = "tags", op = "create", tag_id = tag.id, "Tag created");
        Ok(tag)
    }

    async fn delete(&self, id: i64) -> Result<DeletedTagSummary> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Row lock keeps concurrent link/edge inserts from slipping in between
        // the dependent deletes and the tag delete.
        let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM tag WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if locked.is_none() {
            return Err(Error::not_found(EntityKind::Tag, id));
        }

        let links_removed = sqlx::query("DELETE FROM note_tag WHERE tag_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        let edges_removed =
            sqlx::query("DELETE FROM tag_genealogy WHERE child_id = $1 OR parent_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?
                .rows_affected();

        sqlx::query("DELETE FROM tag WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, || format!("Tag {} is still referenced", id)))?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "tags",
            op = "delete",
            tag_id = id,
            links_removed,
            edges_removed,
            "Tag deleted"
        );
        Ok(DeletedTagSummary {
            links_removed,
            edges_removed,
        })
    }
}
