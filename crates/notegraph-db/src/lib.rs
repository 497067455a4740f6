//! # notegraph-db
//!
//! PostgreSQL database layer for notegraph.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for tags, genealogy edges, note/tag links,
//!   notes, note types, doc types and documents
//! - Blob storage for uploaded document files
//! - An in-memory store for tests (feature `mock`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use notegraph_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/notegraph").await?;
//!     let store = db.store();
//!
//!     let tag = store.tags.create("rust").await?;
//!     println!("Created tag: {}", tag.id);
//!     Ok(())
//! }
//! ```
pub mod documents;
pub mod file_storage;
pub mod genealogy;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod note_tags;
pub mod note_types;
pub mod notes;
pub mod pool;
pub mod tags;
pub mod users;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

use std::sync::Arc;

// Re-export core types
pub use notegraph_core::*;

pub use documents::{PgDocTypeRepository, PgDocumentRepository};
pub use file_storage::{
    compute_content_hash, generate_storage_path, sanitize_filename, store_upload,
    FilesystemBackend, StorageBackend,
};
pub use genealogy::PgGenealogyRepository;
pub use note_tags::PgNoteTagRepository;
pub use note_types::PgNoteTypeRepository;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use tags::PgTagRepository;
pub use users::PgUserDirectory;

/// Translate a failed write into the error taxonomy.
///
/// Unique violations become `Conflict` with the caller's message; foreign key
/// violations mean a referenced row is missing.
pub(crate) fn map_write_error(err: sqlx::Error, conflict: impl FnOnce() -> String) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return Error::Conflict(conflict());
        }
        if db_err.is_foreign_key_violation() {
            return Error::InvalidInput(format!(
                "referenced record does not exist ({})",
                db_err.constraint().unwrap_or("foreign key")
            ));
        }
    }
    Error::Database(err)
}

/// Combined database context with all repositories.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    pub tags: PgTagRepository,
    /// Parent/child edges between tags.
    pub genealogy: PgGenealogyRepository,
    /// Note/tag links.
    pub note_tags: PgNoteTagRepository,
    pub notes: PgNoteRepository,
    pub note_types: PgNoteTypeRepository,
    pub doc_types: PgDocTypeRepository,
    pub documents: PgDocumentRepository,
    /// Read-only view of note owners.
    pub users: PgUserDirectory,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            tags: PgTagRepository::new(pool.clone()),
            genealogy: PgGenealogyRepository::new(pool.clone()),
            note_tags: PgNoteTagRepository::new(pool.clone()),
            notes: PgNoteRepository::new(pool.clone()),
            note_types: PgNoteTypeRepository::new(pool.clone()),
            doc_types: PgDocTypeRepository::new(pool.clone()),
            documents: PgDocumentRepository::new(pool.clone()),
            users: PgUserDirectory::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Bundle the repositories as trait objects for services and handlers.
    pub fn store(&self) -> Store {
        Store {
            tags: Arc::new(self.tags.clone()),
            genealogy: Arc::new(self.genealogy.clone()),
            note_tags: Arc::new(self.note_tags.clone()),
            notes: Arc::new(self.notes.clone()),
            note_types: Arc::new(self.note_types.clone()),
            doc_types: Arc::new(self.doc_types.clone()),
            documents: Arc::new(self.documents.clone()),
            users: Arc::new(self.users.clone()),
        }
    }
}
