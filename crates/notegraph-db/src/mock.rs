//! In-memory store for deterministic testing.
//!
//! [`MemoryStore`] implements every repository trait over plain collections
//! behind a single mutex, enforcing the same uniqueness and reference rules
//! as the PostgreSQL schema. [`MemoryBlobStore`] does the same for blobs.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use notegraph_db::mock::MemoryStore;
//!
//! let mem = MemoryStore::new().with_user(1);
//! let store = mem.store();
//! let tag = store.tags.create("rust").await?;
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use notegraph_core::{
    sort_tag_counts, CreateNoteRequest, DeletedDocumentSummary, DeletedTagSummary, DocType,
    DocTypeRepository, Document, DocumentRepository, EntityKind, Error, GenealogyRepository,
    NewDocument, Note, NoteRepository, NoteTagLink, NoteTagRepository, NoteType,
    NoteTypeRepository, ResourceRepository, Result, Store, Tag, TagGenealogy, TagNoteCount,
    TagRepository, UpdateNoteRequest, UserDirectory,
};

use crate::file_storage::StorageBackend;
use crate::genealogy::missing_edge;

/// Rows keyed by id with a per-table sequence, like a BIGSERIAL column.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    users: BTreeSet<i64>,
    tags: Table<Tag>,
    /// (child_id, parent_id)
    edges: BTreeSet<(i64, i64)>,
    /// (note_id, tag_id)
    links: BTreeSet<(i64, i64)>,
    notes: Table<Note>,
    note_types: Table<NoteType>,
    doc_types: Table<DocType>,
    documents: Table<Document>,
}

impl MemoryState {
    fn tags_by_id(&self, ids: impl Iterator<Item = i64>) -> Vec<Tag> {
        let ids: BTreeSet<i64> = ids.collect();
        ids.into_iter()
            .filter_map(|id| self.tags.rows.get(&id).cloned())
            .collect()
    }

    fn remove_note(&mut self, note_id: i64) -> u64 {
        let before = self.links.len();
        self.links.retain(|(n, _)| *n != note_id);
        self.notes.rows.remove(&note_id);
        (before - self.links.len()) as u64
    }
}

fn foreign_key(table: &str, id: i64) -> Error {
    Error::InvalidInput(format!("{} {} is not present", table, id))
}

/// In-memory implementation of every repository trait.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a known note owner.
    pub fn with_user(self, user_id: i64) -> Self {
        self.add_user(user_id);
        self
    }

    pub fn add_user(&self, user_id: i64) {
        self.lock().users.insert(user_id);
    }

    /// Bundle this store as repository trait objects.
    pub fn store(&self) -> Store {
        Store {
            tags: Arc::new(self.clone()),
            genealogy: Arc::new(self.clone()),
            note_tags: Arc::new(self.clone()),
            notes: Arc::new(self.clone()),
            note_types: Arc::new(self.clone()),
            doc_types: Arc::new(self.clone()),
            documents: Arc::new(self.clone()),
            users: Arc::new(self.clone()),
        }
    }

    /// Number of stored genealogy edges.
    pub fn edge_count(&self) -> usize {
        self.lock().edges.len()
    }

    /// Number of stored note/tag links.
    pub fn link_count(&self) -> usize {
        self.lock().links.len()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

// =============================================================================
// TAGS AND GENEALOGY
// =============================================================================

#[async_trait]
impl ResourceRepository<Tag> for MemoryStore {
    async fn list(&self) -> Result<Vec<Tag>> {
        Ok(self.lock().tags.rows.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Tag>> {
        Ok(self.lock().tags.rows.get(&id).cloned())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.lock().tags.rows.contains_key(&id))
    }
}

#[async_trait]
impl TagRepository for MemoryStore {
    async fn create(&self, title: &str) -> Result<Tag> {
        let mut state = self.lock();
        let tag = Tag {
            id: state.tags.next_id(),
            title: title.to_string(),
        };
        state.tags.rows.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn delete(&self, id: i64) -> Result<DeletedTagSummary> {
        let mut state = self.lock();
        if state.tags.rows.remove(&id).is_none() {
            return Err(Error::not_found(EntityKind::Tag, id));
        }
        let links_before = state.links.len();
        state.links.retain(|(_, tag_id)| *tag_id != id);
        let edges_before = state.edges.len();
        state
            .edges
            .retain(|(child, parent)| *child != id && *parent != id);
        Ok(DeletedTagSummary {
            links_removed: (links_before - state.links.len()) as u64,
            edges_removed: (edges_before - state.edges.len()) as u64,
        })
    }
}

#[async_trait]
impl GenealogyRepository for MemoryStore {
    async fn add_edges(&self, edges: &[TagGenealogy]) -> Result<()> {
        let mut state = self.lock();
        let mut pending = BTreeSet::new();
        for edge in edges {
            for id in [edge.child_id, edge.parent_id] {
                if !state.tags.rows.contains_key(&id) {
                    return Err(foreign_key("tag", id));
                }
            }
            let key = (edge.child_id, edge.parent_id);
            if state.edges.contains(&key) || !pending.insert(key) {
                return Err(Error::Conflict(format!(
                    "Tag {} is already a child of tag {}",
                    edge.child_id, edge.parent_id
                )));
            }
        }
        state.edges.extend(pending);
        Ok(())
    }

    async fn remove_edges(&self, edges: &[TagGenealogy]) -> Result<()> {
        let mut state = self.lock();
        let mut remaining = state.edges.clone();
        for edge in edges {
            if !remaining.remove(&(edge.child_id, edge.parent_id)) {
                return Err(missing_edge(edge));
            }
        }
        state.edges = remaining;
        Ok(())
    }

    async fn children_of(&self, tag_id: i64) -> Result<Vec<Tag>> {
        let state = self.lock();
        let ids = state
            .edges
            .iter()
            .filter(|(_, parent)| *parent == tag_id)
            .map(|(child, _)| *child);
        Ok(state.tags_by_id(ids))
    }

    async fn parents_of(&self, tag_id: i64) -> Result<Vec<Tag>> {
        let state = self.lock();
        let ids = state
            .edges
            .iter()
            .filter(|(child, _)| *child == tag_id)
            .map(|(_, parent)| *parent);
        Ok(state.tags_by_id(ids))
    }
}

// =============================================================================
// NOTES AND LINKS
// =============================================================================

#[async_trait]
impl NoteTagRepository for MemoryStore {
    async fn attach(&self, note_id: i64, tag_id: i64) -> Result<NoteTagLink> {
        let mut state = self.lock();
        if !state.notes.rows.contains_key(&note_id) {
            return Err(foreign_key("note", note_id));
        }
        if !state.tags.rows.contains_key(&tag_id) {
            return Err(foreign_key("tag", tag_id));
        }
        if !state.links.insert((note_id, tag_id)) {
            return Err(Error::Conflict(format!(
                "Tag {} is already attached to note {}",
                tag_id, note_id
            )));
        }
        Ok(NoteTagLink { note_id, tag_id })
    }

    async fn detach(&self, note_id: i64, tag_id: i64) -> Result<bool> {
        Ok(self.lock().links.remove(&(note_id, tag_id)))
    }

    async fn count_by_tag(&self) -> Result<Vec<TagNoteCount>> {
        let state = self.lock();
        let mut per_tag: BTreeMap<i64, i64> = BTreeMap::new();
        for (_, tag_id) in &state.links {
            *per_tag.entry(*tag_id).or_default() += 1;
        }
        let mut counts: Vec<TagNoteCount> = per_tag
            .into_iter()
            .map(|(tag_id, count)| TagNoteCount { tag_id, count })
            .collect();
        sort_tag_counts(&mut counts);
        Ok(counts)
    }

    async fn tags_for_note(&self, note_id: i64) -> Result<Vec<Tag>> {
        let state = self.lock();
        let ids = state
            .links
            .iter()
            .filter(|(n, _)| *n == note_id)
            .map(|(_, t)| *t);
        Ok(state.tags_by_id(ids))
    }

    async fn notes_for_tag(&self, tag_id: i64) -> Result<Vec<Note>> {
        let state = self.lock();
        let ids: BTreeSet<i64> = state
            .links
            .iter()
            .filter(|(_, t)| *t == tag_id)
            .map(|(n, _)| *n)
            .collect();
        Ok(ids
            .into_iter()
            .filter_map(|id| state.notes.rows.get(&id).cloned())
            .collect())
    }
}

#[async_trait]
impl ResourceRepository<Note> for MemoryStore {
    async fn list(&self) -> Result<Vec<Note>> {
        Ok(self.lock().notes.rows.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Note>> {
        Ok(self.lock().notes.rows.get(&id).cloned())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.lock().notes.rows.contains_key(&id))
    }
}

#[async_trait]
impl NoteRepository for MemoryStore {
    async fn insert(&self, req: &CreateNoteRequest) -> Result<Note> {
        let mut state = self.lock();
        if !state.users.contains(&req.owner_id) {
            return Err(foreign_key("app_user", req.owner_id));
        }
        if let Some(document_id) = req.document_id {
            if !state.documents.rows.contains_key(&document_id) {
                return Err(foreign_key("document", document_id));
            }
        }
        let note = Note {
            id: state.notes.next_id(),
            created_at_utc: Utc::now(),
            owner_id: req.owner_id,
            subject: req.subject.clone(),
            document_id: req.document_id,
            type_id: req.type_id,
            payload: req.payload.clone(),
        };
        state.notes.rows.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update(&self, id: i64, req: &UpdateNoteRequest) -> Result<Note> {
        let mut state = self.lock();
        let note = state
            .notes
            .rows
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(EntityKind::Note, id))?;
        if let Some(subject) = &req.subject {
            note.subject = subject.clone();
        }
        if let Some(payload) = &req.payload {
            note.payload = payload.clone();
        }
        Ok(note.clone())
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        let mut state = self.lock();
        if !state.notes.rows.contains_key(&id) {
            return Err(Error::not_found(EntityKind::Note, id));
        }
        Ok(state.remove_note(id))
    }
}

#[async_trait]
impl ResourceRepository<NoteType> for MemoryStore {
    async fn list(&self) -> Result<Vec<NoteType>> {
        Ok(self.lock().note_types.rows.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<NoteType>> {
        Ok(self.lock().note_types.rows.get(&id).cloned())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.lock().note_types.rows.contains_key(&id))
    }
}

#[async_trait]
impl NoteTypeRepository for MemoryStore {
    async fn create(&self, name: &str) -> Result<NoteType> {
        let mut state = self.lock();
        let note_type = NoteType {
            id: state.note_types.next_id(),
            name: name.to_string(),
        };
        state.note_types.rows.insert(note_type.id, note_type.clone());
        Ok(note_type)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.lock().note_types.rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(Error::not_found(EntityKind::Type, id)),
        }
    }
}

// =============================================================================
// DOCUMENTS
// =============================================================================

#[async_trait]
impl ResourceRepository<DocType> for MemoryStore {
    async fn list(&self) -> Result<Vec<DocType>> {
        Ok(self.lock().doc_types.rows.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<DocType>> {
        Ok(self.lock().doc_types.rows.get(&id).cloned())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.lock().doc_types.rows.contains_key(&id))
    }
}

#[async_trait]
impl DocTypeRepository for MemoryStore {
    async fn create(&self, title: &str) -> Result<DocType> {
        let mut state = self.lock();
        let doc_type = DocType {
            id: state.doc_types.next_id(),
            title: title.to_string(),
        };
        state.doc_types.rows.insert(doc_type.id, doc_type.clone());
        Ok(doc_type)
    }
}

#[async_trait]
impl ResourceRepository<Document> for MemoryStore {
    async fn list(&self) -> Result<Vec<Document>> {
        Ok(self.lock().documents.rows.values().cloned().collect())
    }

    async fn get(&self, id: i64) -> Result<Option<Document>> {
        Ok(self.lock().documents.rows.get(&id).cloned())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.lock().documents.rows.contains_key(&id))
    }
}

#[async_trait]
impl DocumentRepository for MemoryStore {
    async fn insert(&self, doc: NewDocument) -> Result<Document> {
        let mut state = self.lock();
        if !state.doc_types.rows.contains_key(&doc.type_id) {
            return Err(foreign_key("doc_type", doc.type_id));
        }
        let file = doc.file;
        let document = Document {
            id: state.documents.next_id(),
            type_id: doc.type_id,
            file_name: file.as_ref().map(|f| f.file_name.clone()),
            storage_path: file.as_ref().map(|f| f.storage_path.clone()),
            size_bytes: file.as_ref().map(|f| f.size_bytes),
            content_hash: file.map(|f| f.content_hash),
            created_at_utc: Utc::now(),
        };
        state.documents.rows.insert(document.id, document.clone());
        Ok(document)
    }

    async fn delete(&self, id: i64) -> Result<(Document, DeletedDocumentSummary)> {
        let mut state = self.lock();
        let document = state
            .documents
            .rows
            .remove(&id)
            .ok_or_else(|| Error::not_found(EntityKind::Document, id))?;
        let note_ids: Vec<i64> = state
            .notes
            .rows
            .values()
            .filter(|n| n.document_id == Some(id))
            .map(|n| n.id)
            .collect();
        let mut summary = DeletedDocumentSummary::default();
        for note_id in note_ids {
            summary.links_removed += state.remove_note(note_id);
            summary.notes_removed += 1;
        }
        Ok((document, summary))
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn user_exists(&self, user_id: i64) -> Result<bool> {
        Ok(self.lock().users.contains(&user_id))
    }
}

// =============================================================================
// BLOBS
// =============================================================================

/// In-memory [`StorageBackend`].
#[derive(Clone, Default)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.blobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl StorageBackend for MemoryBlobStore {
    async fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.lock().insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.lock()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::Storage(format!("blob {} not found", path)))
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.lock().remove(path);
        Ok(())
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.lock().contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note_request(owner_id: i64, document_id: Option<i64>) -> CreateNoteRequest {
        CreateNoteRequest {
            owner_id,
            document_id,
            type_id: 1,
            subject: "subject".to_string(),
            payload: "payload".to_string(),
        }
    }

    #[tokio::test]
    async fn test_tag_ids_are_sequential() {
        let store = MemoryStore::new().store();
        let a = store.tags.create("a").await.unwrap();
        let b = store.tags.create("b").await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
        assert_eq!(store.tags.list().await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn test_add_edges_is_all_or_nothing() {
        let mem = MemoryStore::new();
        let store = mem.store();
        let a = store.tags.create("a").await.unwrap();
        let b = store.tags.create("b").await.unwrap();
        let c = store.tags.create("c").await.unwrap();
        store
            .genealogy
            .add_edges(&[TagGenealogy::new(b.id, a.id)])
            .await
            .unwrap();

        let err = store
            .genealogy
            .add_edges(&[
                TagGenealogy::new(c.id, b.id),
                TagGenealogy::new(b.id, a.id),
            ])
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(mem.edge_count(), 1);
    }

    #[tokio::test]
    async fn test_remove_edges_is_all_or_nothing() {
        let mem = MemoryStore::new();
        let store = mem.store();
        let a = store.tags.create("a").await.unwrap();
        let b = store.tags.create("b").await.unwrap();
        let c = store.tags.create("c").await.unwrap();
        store
            .genealogy
            .add_edges(&[TagGenealogy::new(b.id, a.id)])
            .await
            .unwrap();

        let err = store
            .genealogy
            .remove_edges(&[
                TagGenealogy::new(b.id, a.id),
                TagGenealogy::new(c.id, b.id),
            ])
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(mem.edge_count(), 1);

        store
            .genealogy
            .remove_edges(&[TagGenealogy::new(b.id, a.id)])
            .await
            .unwrap();
        assert_eq!(mem.edge_count(), 0);
    }

    #[tokio::test]
    async fn test_attach_twice_conflicts() {
        let mem = MemoryStore::new().with_user(1);
        let store = mem.store();
        let tag = store.tags.create("t").await.unwrap();
        let note = store.notes.insert(&note_request(1, None)).await.unwrap();

        store.note_tags.attach(note.id, tag.id).await.unwrap();
        let err = store.note_tags.attach(note.id, tag.id).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(mem.link_count(), 1);
    }

    #[tokio::test]
    async fn test_tag_delete_cascades() {
        let mem = MemoryStore::new().with_user(1);
        let store = mem.store();
        let a = store.tags.create("a").await.unwrap();
        let b = store.tags.create("b").await.unwrap();
        let note = store.notes.insert(&note_request(1, None)).await.unwrap();
        store.note_tags.attach(note.id, a.id).await.unwrap();
        store
            .genealogy
            .add_edges(&[TagGenealogy::new(b.id, a.id), TagGenealogy::new(a.id, a.id)])
            .await
            .unwrap();

        let summary = store.tags.delete(a.id).await.unwrap();
        assert_eq!(summary.links_removed, 1);
        assert_eq!(summary.edges_removed, 2);
        assert_eq!(mem.edge_count(), 0);
        assert!(store.notes.exists(note.id).await.unwrap());

        let err = store.tags.delete(a.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_insert_note_requires_known_owner() {
        let store = MemoryStore::new().store();
        let err = store.notes.insert(&note_request(9, None)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_document_delete_removes_dependent_notes() {
        let mem = MemoryStore::new().with_user(1);
        let store = mem.store();
        let doc_type = store.doc_types.create("pdf").await.unwrap();
        let doc = store
            .documents
            .insert(NewDocument {
                type_id: doc_type.id,
                file: None,
            })
            .await
            .unwrap();
        let tag = store.tags.create("t").await.unwrap();
        let attached = store.notes.insert(&note_request(1, Some(doc.id))).await.unwrap();
        let free = store.notes.insert(&note_request(1, None)).await.unwrap();
        store.note_tags.attach(attached.id, tag.id).await.unwrap();

        let (removed, summary) = store.documents.delete(doc.id).await.unwrap();
        assert_eq!(removed.id, doc.id);
        assert_eq!(summary.notes_removed, 1);
        assert_eq!(summary.links_removed, 1);
        assert!(!store.notes.exists(attached.id).await.unwrap());
        assert!(store.notes.exists(free.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_blob_store_roundtrip() {
        let blobs = MemoryBlobStore::new();
        blobs.write("a", b"x").await.unwrap();
        assert_eq!(blobs.read("a").await.unwrap(), b"x");
        blobs.delete("a").await.unwrap();
        assert!(blobs.is_empty());
        assert!(blobs.read("a").await.is_err());
    }
}
