//! Note/tag link repository.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::debug;

use notegraph_core::{Error, Note, NoteTagLink, NoteTagRepository, Result, Tag, TagNoteCount};

use crate::map_write_error;
use crate::notes::NOTE_COLUMNS;

/// PostgreSQL implementation of NoteTagRepository.
#[derive(Clone)]
pub struct PgNoteTagRepository {
    pool: Pool<Postgres>,
}

impl PgNoteTagRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteTagRepository for PgNoteTagRepository {
    async fn attach(&self, note_id: i64, tag_id: i64) -> Result<NoteTagLink> {
        let link = sqlx::query_as::<_, NoteTagLink>(
            "INSERT INTO note_tag (note_id, tag_id) VALUES ($1, $2) RETURNING note_id, tag_id",
        )
        .bind(note_id)
        .bind(tag_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(e, || {
                format!("Tag {} is already attached to note {}", tag_id, note_id)
            })
        })?;

        debug!(
            subsystem = "db",
            component = "note_tags",
            op = "attach",
            note_id,
            tag_id,
            "Tag attached to note"
        );
        Ok(link)
    }

    async fn detach(&self, note_id: i64, tag_id: i64) -> Result<bool> {
        let removed = sqlx::query("DELETE FROM note_tag WHERE note_id = $1 AND tag_id = $2")
            .bind(note_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?
            .rows_affected();
        Ok(removed > 0)
    }

    async fn count_by_tag(&self) -> Result<Vec<TagNoteCount>> {
        sqlx::query_as::<_, TagNoteCount>(
            r#"
            SELECT tag_id, COUNT(DISTINCT note_id) AS count
            FROM note_tag
            GROUP BY tag_id
            ORDER BY count DESC, tag_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn tags_for_note(&self, note_id: i64) -> Result<Vec<Tag>> {
        sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.id, t.title
            FROM note_tag nt
            JOIN tag t ON t.id = nt.tag_id
            WHERE nt.note_id = $1
            ORDER BY t.id
            "#,
        )
        .bind(note_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)
    }

    async fn notes_for_tag(&self, tag_id: i64) -> Result<Vec<Note>> {
        let sql = format!(
            "SELECT {} FROM note_tag nt JOIN note n ON n.id = nt.note_id WHERE nt.tag_id = $1 ORDER BY n.id",
            NOTE_COLUMNS
        );
        sqlx::query_as::<_, Note>(&sql)
            .bind(tag_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
    }
}
