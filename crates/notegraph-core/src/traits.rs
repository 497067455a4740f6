//! Core traits for notegraph abstractions.
//!
//! These traits define the interfaces that the storage backends must satisfy.
//! Services and HTTP handlers only ever see the trait objects bundled in
//! [`Store`], so the PostgreSQL and in-memory stores are interchangeable.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// GENERIC RESOURCE ACCESS
// =============================================================================

/// Read access shared by every stored resource kind.
#[async_trait]
pub trait ResourceRepository<T>: Send + Sync {
    /// List all records ordered by id.
    async fn list(&self) -> Result<Vec<T>>;

    /// Fetch one record.
    async fn get(&self, id: i64) -> Result<Option<T>>;

    /// Check whether a record exists without loading it.
    async fn exists(&self, id: i64) -> Result<bool>;
}

// =============================================================================
// TAG GRAPH TRAITS
// =============================================================================

/// Repository for tags.
#[async_trait]
pub trait TagRepository: ResourceRepository<Tag> {
    /// Create a tag.
    async fn create(&self, title: &str) -> Result<Tag>;

    /// Delete a tag together with its note links and genealogy edges.
    ///
    /// Runs as one atomic unit. Fails with `NotFound` if the tag is absent.
    async fn delete(&self, id: i64) -> Result<DeletedTagSummary>;
}

/// Repository for parent/child edges between tags.
#[async_trait]
pub trait GenealogyRepository: Send + Sync {
    /// Insert all edges or none. A duplicate pair fails with `Conflict`.
    async fn add_edges(&self, edges: &[TagGenealogy]) -> Result<()>;

    /// Remove all edges or none. Fails with `NotFound` naming the first
    /// edge that does not exist.
    async fn remove_edges(&self, edges: &[TagGenealogy]) -> Result<()>;

    /// Tags for which `tag_id` is the parent.
    async fn children_of(&self, tag_id: i64) -> Result<Vec<Tag>>;

    /// Tags for which `tag_id` is the child.
    async fn parents_of(&self, tag_id: i64) -> Result<Vec<Tag>>;
}

// =============================================================================
// NOTE TRAITS
// =============================================================================

/// Repository for note/tag links.
#[async_trait]
pub trait NoteTagRepository: Send + Sync {
    /// Link a tag to a note. A duplicate pair fails with `Conflict`.
    async fn attach(&self, note_id: i64, tag_id: i64) -> Result<NoteTagLink>;

    /// Remove a link. Returns false if it did not exist.
    async fn detach(&self, note_id: i64, tag_id: i64) -> Result<bool>;

    /// Distinct note counts for every tag with at least one link,
    /// sorted by count descending then tag id ascending.
    async fn count_by_tag(&self) -> Result<Vec<TagNoteCount>>;

    /// Tags linked to a note, ordered by tag id.
    async fn tags_for_note(&self, note_id: i64) -> Result<Vec<Tag>>;

    /// Notes linked to a tag, ordered by note id.
    async fn notes_for_tag(&self, tag_id: i64) -> Result<Vec<Note>>;
}

/// Repository for notes.
#[async_trait]
pub trait NoteRepository: ResourceRepository<Note> {
    /// Insert a note whose references have already been validated.
    async fn insert(&self, req: &CreateNoteRequest) -> Result<Note>;

    /// Apply a partial update to subject/payload. `NotFound` if absent.
    async fn update(&self, id: i64, req: &UpdateNoteRequest) -> Result<Note>;

    /// Delete a note and its tag links atomically. Returns the number of
    /// links removed; `NotFound` if absent.
    async fn delete(&self, id: i64) -> Result<u64>;
}

/// Repository for note types.
#[async_trait]
pub trait NoteTypeRepository: ResourceRepository<NoteType> {
    async fn create(&self, name: &str) -> Result<NoteType>;

    /// Delete a type. Notes that reference it are left untouched.
    async fn delete(&self, id: i64) -> Result<()>;
}

// =============================================================================
// DOCUMENT TRAITS
// =============================================================================

/// Repository for document types.
#[async_trait]
pub trait DocTypeRepository: ResourceRepository<DocType> {
    async fn create(&self, title: &str) -> Result<DocType>;
}

/// Repository for document metadata rows.
#[async_trait]
pub trait DocumentRepository: ResourceRepository<Document> {
    async fn insert(&self, doc: NewDocument) -> Result<Document>;

    /// Delete a document with its dependent notes and their links, atomically.
    /// Returns the removed row so the caller can release its blob.
    async fn delete(&self, id: i64) -> Result<(Document, DeletedDocumentSummary)>;
}

// =============================================================================
// EXTERNAL COLLABORATORS
// =============================================================================

/// Directory of known note owners.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user_id: i64) -> Result<bool>;
}

/// Bundle of repository trait objects handed to services and handlers.
#[derive(Clone)]
pub struct Store {
    pub tags: Arc<dyn TagRepository>,
    pub genealogy: Arc<dyn GenealogyRepository>,
    pub note_tags: Arc<dyn NoteTagRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub note_types: Arc<dyn NoteTypeRepository>,
    pub doc_types: Arc<dyn DocTypeRepository>,
    pub documents: Arc<dyn DocumentRepository>,
    pub users: Arc<dyn UserDirectory>,
}
