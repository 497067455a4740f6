//! Tag genealogy (parent/child edge) repository.
//!
//! Edges are directed: `parent_id` sits one level above `child_id`. The pair
//! is unique at the storage level (`tag_genealogy_unique_pair`), so two
//! concurrent inserts of the same edge cannot both succeed. Self-loops and
//! cycles are accepted.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::debug;

use notegraph_core::{Error, GenealogyRepository, Result, Tag, TagGenealogy};

use crate::map_write_error;

pub(crate) fn missing_edge(edge: &TagGenealogy) -> Error {
    Error::NotFound(format!(
        "Tag {} is not a child of tag {}",
        edge.child_id, edge.parent_id
    ))
}

/// PostgreSQL implementation of GenealogyRepository.
#[derive(Clone)]
pub struct PgGenealogyRepository {
    pool: Pool<Postgres>,
}

impl PgGenealogyRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenealogyRepository for PgGenealogyRepository {
    async fn add_edges(&self, edges: &[TagGenealogy]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        for edge in edges {
            sqlx::query("INSERT INTO tag_genealogy (child_id, parent_id) VALUES ($1, $2)")
                .bind(edge.child_id)
                .bind(edge.parent_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    map_write_error(e, || {
                        format!(
                            "Tag {} is already a child of tag {}",
                            edge.child_id, edge.parent_id
                        )
                    })
                })?;
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "genealogy",
            op = "add_edges",
            edge_count = edges.len(),
            "Genealogy edges created"
        );
        Ok(())
    }

    async fn remove_edges(&self, edges: &[TagGenealogy]) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        for edge in edges {
            let removed =
                sqlx::query("DELETE FROM tag_genealogy WHERE child_id = $1 AND parent_id = $2")
                    .bind(edge.child_id)
                    .bind(edge.parent_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(Error::Database)?
                    .rows_affected();
            if removed == 0 {
                // dropping tx rolls back edges removed so far
                return Err(missing_edge(edge));
            }
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "genealogy",
            op = "remove_edges",
            edge_count = edges.len(),
            "Genealogy edges removed"
        );
        Ok(())
    }

    async fn children_of(&self, tag_id: i64) -> Result<Vec<Tag>> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.title
            FROM tag_genealogy g
            JOIN tag t ON t.id = g.child_id
            WHERE g.parent_id = $1
            ORDER BY t.id
            "#,
        )
        .bind(tag_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn parents_of(&self, tag_id: i64) -> Result<Vec<Tag>> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.title
            FROM tag_genealogy g
            JOIN tag t ON t.id = g.parent_id
            WHERE g.child_id = $1
            ORDER BY t.id
            "#,
        )
        .bind(tag_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }
}
