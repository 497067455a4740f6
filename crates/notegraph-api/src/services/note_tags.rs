//! Note/tag association operations.

use tracing::debug;

use notegraph_core::{
    EntityKind, Error, NoteTagLink, NoteTagRepository, ResourceRepository, Result, Store,
    TagNoteCount,
};

/// Service managing the many-to-many link between notes and tags.
#[derive(Clone)]
pub struct NoteTagService {
    store: Store,
}

impl NoteTagService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Attach a tag to the note addressed by path.
    ///
    /// A missing note is `NotFound`; a missing tag is a bad reference.
    pub async fn attach(&self, note_id: i64, tag_id: i64) -> Result<NoteTagLink> {
        if !self.store.notes.exists(note_id).await? {
            return Err(Error::not_found(EntityKind::Note, note_id));
        }
        if !self.store.tags.exists(tag_id).await? {
            return Err(Error::missing_reference(EntityKind::Tag, tag_id));
        }

        let link = self.store.note_tags.attach(note_id, tag_id).await?;
        debug!(subsystem = "api", op = "attach", note_id, tag_id, "Tag attached");
        Ok(link)
    }

    pub async fn detach(&self, note_id: i64, tag_id: i64) -> Result<()> {
        if self.store.note_tags.detach(note_id, tag_id).await? {
            Ok(())
        } else {
            Err(Error::NotFound(format!(
                "Tag {} is not attached to note {}",
                tag_id, note_id
            )))
        }
    }

    /// Distinct note counts per used tag, most used first.
    pub async fn counts(&self) -> Result<Vec<TagNoteCount>> {
        self.store.note_tags.count_by_tag().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notegraph_core::{CreateNoteRequest, NoteRepository, TagRepository};
    use notegraph_db::mock::MemoryStore;

    async fn setup() -> (NoteTagService, Store, i64, i64) {
        let store = MemoryStore::new().with_user(1).store();
        let tag = store.tags.create("t").await.unwrap();
        let note = store
            .notes
            .insert(&CreateNoteRequest {
                owner_id: 1,
                document_id: None,
                type_id: 1,
                subject: "s".to_string(),
                payload: "p".to_string(),
            })
            .await
            .unwrap();
        (NoteTagService::new(store.clone()), store, note.id, tag.id)
    }

    #[tokio::test]
    async fn test_attach_detach_attach() {
        let (service, _, note_id, tag_id) = setup().await;
        service.attach(note_id, tag_id).await.unwrap();
        assert!(service.attach(note_id, tag_id).await.unwrap_err().is_conflict());

        service.detach(note_id, tag_id).await.unwrap();
        service.attach(note_id, tag_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_attach_unknown_ids() {
        let (service, _, note_id, tag_id) = setup().await;
        let err = service.attach(note_id + 100, tag_id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let err = service.attach(note_id, tag_id + 100).await.unwrap_err();
        assert!(matches!(err, Error::ReferenceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_detach_missing_link_is_not_found() {
        let (service, _, note_id, tag_id) = setup().await;
        let err = service.detach(note_id, tag_id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_counts_omit_unused_tags() {
        let (service, store, note_id, tag_id) = setup().await;
        store.tags.create("unused").await.unwrap();
        service.attach(note_id, tag_id).await.unwrap();

        let counts = service.counts().await.unwrap();
        assert_eq!(counts, vec![TagNoteCount { tag_id, count: 1 }]);
    }
}
