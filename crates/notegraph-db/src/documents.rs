//! Document and document type repositories.
//!
//! Only metadata lives here; file bytes are kept by a
//! [`StorageBackend`](crate::file_storage::StorageBackend).

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use tracing::debug;

use notegraph_core::{
    DeletedDocumentSummary, DocType, DocTypeRepository, Document, DocumentRepository, EntityKind,
    Error, NewDocument, ResourceRepository, Result,
};

use crate::map_write_error;

const DOCUMENT_COLUMNS: &str =
    "id, type_id, file_name, storage_path, size_bytes, content_hash, created_at_utc";

// =============================================================================
// DOC TYPES
// =============================================================================

/// PostgreSQL implementation of DocTypeRepository.
#[derive(Clone)]
pub struct PgDocTypeRepository {
    pool: Pool<Postgres>,
}

impl PgDocTypeRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceRepository<DocType> for PgDocTypeRepository {
    async fn list(&self) -> Result<Vec<DocType>> {
        sqlx::query_as::<_, DocType>("SELECT id, title FROM doc_type ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn get(&self, id: i64) -> Result<Option<DocType>> {
        sqlx::query_as::<_, DocType>("SELECT id, title FROM doc_type WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM doc_type WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}

#[async_trait]
impl DocTypeRepository for PgDocTypeRepository {
    async fn create(&self, title: &str) -> Result<DocType> {
        sqlx::query_as::<_, DocType>("INSERT INTO doc_type (title) VALUES ($1) RETURNING id, title")
            .bind(title)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}

// =============================================================================
// DOCUMENTS
// =============================================================================

/// PostgreSQL implementation of DocumentRepository.
#[derive(Clone)]
pub struct PgDocumentRepository {
    pool: Pool<Postgres>,
}

impl PgDocumentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResourceRepository<Document> for PgDocumentRepository {
    async fn list(&self) -> Result<Vec<Document>> {
        let sql = format!("SELECT {} FROM document ORDER BY id", DOCUMENT_COLUMNS);
        sqlx::query_as::<_, Document>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn get(&self, id: i64) -> Result<Option<Document>> {
        let sql = format!("SELECT {} FROM document WHERE id = $1", DOCUMENT_COLUMNS);
        sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM document WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}

#[async_trait]
impl DocumentRepository for PgDocumentRepository {
    async fn insert(&self, doc: NewDocument) -> Result<Document> {
        let sql = format!(
            r#"
            INSERT INTO document (type_id, file_name, storage_path, size_bytes, content_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            DOCUMENT_COLUMNS
        );
        let file = doc.file.as_ref();
        let document = sqlx::query_as::<_, Document>(&sql)
            .bind(doc.type_id)
            .bind(file.map(|f| f.file_name.as_str()))
            .bind(file.map(|f| f.storage_path.as_str()))
            .bind(file.map(|f| f.size_bytes))
            .bind(file.map(|f| f.content_hash.as_str()))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, || "Document already exists".to_string()))?;

        debug!(
            subsystem = "db",
            component = "documents",
            op = "insert",
            document_id = document.id,
            has_file = document.storage_path.is_some(),
            "Document created"
        );
        Ok(document)
    }

    async fn delete(&self, id: i64) -> Result<(Document, DeletedDocumentSummary)> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let sql = format!("SELECT {} FROM document WHERE id = $1 FOR UPDATE", DOCUMENT_COLUMNS);
        let document = sqlx::query_as::<_, Document>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::not_found(EntityKind::Document, id))?;

        let links_removed = sqlx::query(
            "DELETE FROM note_tag WHERE note_id IN (SELECT id FROM note WHERE document_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        let notes_removed = sqlx::query("DELETE FROM note WHERE document_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        sqlx::query("DELETE FROM document WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_write_error(e, || format!("Document {} is still referenced", id)))?;

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "documents",
            op = "delete",
            document_id = id,
            notes_removed,
            links_removed,
            "Document deleted"
        );
        Ok((
            document,
            DeletedDocumentSummary {
                notes_removed,
                links_removed,
            },
        ))
    }
}
