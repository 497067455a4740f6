//! Read-side note queries that combine links and the tag graph.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, trace};

use notegraph_core::{
    EntityKind, Error, GenealogyRepository, Note, NoteTagRepository, NoteWithTags,
    ResourceRepository, Result, Store, TagNeighborhoodNotes,
};

/// Service answering note lookups by id and by tag neighbourhood.
#[derive(Clone)]
pub struct NoteQueryService {
    store: Store,
}

impl NoteQueryService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn list_notes(&self) -> Result<Vec<Note>> {
        self.store.notes.list().await
    }

    /// A note with the tags attached to it.
    pub async fn get_note(&self, note_id: i64) -> Result<NoteWithTags> {
        let note_info = self
            .store
            .notes
            .get(note_id)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::Note, note_id))?;
        let related_tags = self.store.note_tags.tags_for_note(note_id).await?;
        Ok(NoteWithTags {
            note_info,
            related_tags,
        })
    }

    /// Notes linked to `tag_id`, plus the notes of each immediate child and
    /// parent tag keyed by that tag's id.
    ///
    /// Buckets are not deduplicated against each other, and neighbours with
    /// no notes map to an empty list.
    pub async fn notes_by_tag_neighborhood(&self, tag_id: i64) -> Result<TagNeighborhoodNotes> {
        let start = Instant::now();
        if !self.store.tags.exists(tag_id).await? {
            return Err(Error::not_found(EntityKind::Tag, tag_id));
        }

        let notes = self.store.note_tags.notes_for_tag(tag_id).await?;
        let children = self.store.genealogy.children_of(tag_id).await?;
        let parents = self.store.genealogy.parents_of(tag_id).await?;

        let mut notes_by_child_tag = BTreeMap::new();
        for child in children {
            let bucket = self.store.note_tags.notes_for_tag(child.id).await?;
            trace!(tag_id, child_id = child.id, result_count = bucket.len(), "child bucket");
            notes_by_child_tag.insert(child.id, bucket);
        }

        let mut notes_by_parent_tag = BTreeMap::new();
        for parent in parents {
            let bucket = self.store.note_tags.notes_for_tag(parent.id).await?;
            trace!(tag_id, parent_id = parent.id, result_count = bucket.len(), "parent bucket");
            notes_by_parent_tag.insert(parent.id, bucket);
        }

        debug!(
            subsystem = "api",
            component = "note_query",
            op = "notes_by_tag_neighborhood",
            tag_id,
            result_count = notes.len(),
            child_count = notes_by_child_tag.len(),
            parent_count = notes_by_parent_tag.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Neighbourhood query complete"
        );

        Ok(TagNeighborhoodNotes {
            notes,
            notes_by_child_tag,
            notes_by_parent_tag,
        })
    }
}
