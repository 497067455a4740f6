//! Note repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use tracing::debug;

use notegraph_core::{
    CreateNoteRequest, EntityKind, Error, Note, NoteRepository, ResourceRepository, Result,
    UpdateNoteRequest,
};

use crate::map_write_error;

/// Standard SELECT columns for `note` aliased as `n`.
pub(crate) const NOTE_COLUMNS: &str =
    "n.id, n.created_at_utc, n.owner_id, n.subject, n.document_id, n.type_id, n.payload";

/// PostgreSQL implementation of NoteRepository.
#[derive(Clone)]
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceRepository<Note> for PgNoteRepository {
    async fn list(&self) -> Result<Vec<Note>> {
        let sql = format!("SELECT {} FROM note n ORDER BY n.id", NOTE_COLUMNS);
        sqlx::query_as::<_, Note>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn get(&self, id: i64) -> Result<Option<Note>> {
        let sql = format!("SELECT {} FROM note n WHERE n.id = $1", NOTE_COLUMNS);
        sqlx::query_as::<_, Note>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM note WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, req: &CreateNoteRequest) -> Result<Note> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO note (created_at_utc, owner_id, subject, document_id, type_id, payload)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at_utc, owner_id, subject, document_id, type_id, payload
            "#,
        )
        .bind(Utc::now())
        .bind(req.owner_id)
        .bind(&req.subject)
        .bind(req.document_id)
        .bind(req.type_id)
        .bind(&req.payload)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, || "Note already exists".to_string()))?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "insert",
            note_id = note.id,
            owner_id = note.owner_id,
            "Note created"
        );
        Ok(note)
    }

    async fn update(&self, id: i64, req: &UpdateNoteRequest) -> Result<Note> {
        sqlx::query_as::<_, Note>(
            r#"
            UPDATE note SET
                subject = COALESCE($2, subject),
                payload = COALESCE($3, payload)
            WHERE id = $1
            RETURNING id, created_at_utc, owner_id, subject, document_id, type_id, payload
            "#,
        )
        .bind(id)
        .bind(req.subject.as_deref())
        .bind(req.payload.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::not_found(EntityKind::Note, id))
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM note WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if locked.is_none() {
            return Err(Error::not_found(EntityKind::Note, id));
        }

        let links_removed = sqlx::query("DELETE FROM note_tag WHERE note_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "notes",
            op = "delete",
            note_id = id,
            links_removed,
            "Note deleted"
        );
        Ok(links_removed)
    }
}
