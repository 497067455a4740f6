//! Note lifecycle: validated create, partial update, delete.

use tracing::debug;

use notegraph_core::{
    CreateNoteRequest, EntityKind, Error, Note, NoteRepository, ResourceRepository, Result,
    Store, UpdateNoteRequest, UserDirectory,
};

/// Service for writing notes.
#[derive(Clone)]
pub struct NoteService {
    store: Store,
}

impl NoteService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create a note after checking field shape and every referenced id.
    ///
    /// References are checked owner, type, then document; the first missing
    /// one is reported and nothing is written.
    pub async fn create(&self, req: &CreateNoteRequest) -> Result<Note> {
        req.validate()?;
        if !self.store.users.user_exists(req.owner_id).await? {
            return Err(Error::missing_reference(EntityKind::User, req.owner_id));
        }
        if !self.store.note_types.exists(req.type_id).await? {
            return Err(Error::missing_reference(EntityKind::Type, req.type_id));
        }
        if let Some(document_id) = req.document_id {
            if !self.store.documents.exists(document_id).await? {
                return Err(Error::missing_reference(EntityKind::Document, document_id));
            }
        }

        let note = self.store.notes.insert(req).await?;
        debug!(subsystem = "api", op = "create_note", note_id = note.id, "Note created");
        Ok(note)
    }

    /// Apply `subject`/`payload` changes. An empty update returns the note
    /// unchanged.
    pub async fn update(&self, note_id: i64, req: &UpdateNoteRequest) -> Result<Note> {
        req.validate()?;
        if req.is_empty() {
            return self
                .store
                .notes
                .get(note_id)
                .await?
                .ok_or_else(|| Error::not_found(EntityKind::Note, note_id));
        }
        self.store.notes.update(note_id, req).await
    }

    /// Delete a note and its tag links. Returns the number of links removed.
    pub async fn delete(&self, note_id: i64) -> Result<u64> {
        self.store.notes.delete(note_id).await
    }
}
