//! Note type repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use notegraph_core::{EntityKind, Error, NoteType, NoteTypeRepository, ResourceRepository, Result};

/// PostgreSQL implementation of NoteTypeRepository.
#[derive(Clone)]
pub struct PgNoteTypeRepository {
    pool: Pool<Postgres>,
}

impl PgNoteTypeRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceRepository<NoteType> for PgNoteTypeRepository {
    async fn list(&self) -> Result<Vec<NoteType>> {
        sqlx::query_as::<_, NoteType>("SELECT id, name FROM note_type ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn get(&self, id: i64) -> Result<Option<NoteType>> {
        sqlx::query_as::<_, NoteType>("SELECT id, name FROM note_type WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM note_type WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}

#[async_trait]
impl NoteTypeRepository for PgNoteTypeRepository {
    async fn create(&self, name: &str) -> Result<NoteType> {
        sqlx::query_as::<_, NoteType>(
            "INSERT INTO note_type (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        // note.type_id has no foreign key; notes keep the dangling id.
        let removed = sqlx::query("DELETE FROM note_type WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?
            .rows_affected();
        if removed == 0 {
            return Err(Error::not_found(EntityKind::Type, id));
        }
        Ok(())
    }
}
