//! Tag graph operations: tags, their parent/child edges and usage counts.
//!
//! Edges are one hop only. Nothing here walks the graph transitively, so
//! self-loops and cycles are harmless and accepted.

use std::collections::HashMap;

use tracing::debug;

use notegraph_core::{
    CreateTagRequest, DeletedTagSummary, EntityKind, Error, GenealogyRepository,
    NoteTagRepository, ResourceRepository, Result, Store, Tag, TagDetail, TagGenealogy,
    TagRelationRequest, TagRelations, TagRepository, TagWithCount,
};

/// Service for tags and the genealogy graph over them.
#[derive(Clone)]
pub struct TagGraphService {
    store: Store,
}

impl TagGraphService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub async fn create_tag(&self, req: &CreateTagRequest) -> Result<Tag> {
        req.validate()?;
        self.store.tags.create(&req.title).await
    }

    /// Fetch a tag addressed by path.
    pub async fn get_tag(&self, tag_id: i64) -> Result<Tag> {
        self.store
            .tags
            .get(tag_id)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::Tag, tag_id))
    }

    /// All tags ordered by id, each with its note count (0 when unused).
    pub async fn list_tags_with_counts(&self) -> Result<Vec<TagWithCount>> {
        let tags = self.store.tags.list().await?;
        let counts: HashMap<i64, i64> = self
            .store
            .note_tags
            .count_by_tag()
            .await?
            .into_iter()
            .map(|c| (c.tag_id, c.count))
            .collect();

        Ok(tags
            .into_iter()
            .map(|tag| {
                let tag_note_sub_count = counts.get(&tag.id).copied().unwrap_or(0);
                TagWithCount {
                    tag,
                    tag_note_sub_count,
                }
            })
            .collect())
    }

    /// Tag with its linked notes and one-hop neighbours.
    pub async fn tag_detail(&self, tag_id: i64) -> Result<TagDetail> {
        let tag_info = self.get_tag(tag_id).await?;
        let related_notes = self
            .store
            .note_tags
            .notes_for_tag(tag_id)
            .await?
            .iter()
            .map(|n| n.to_ref())
            .collect();
        let TagRelations { children, parents } = self.neighbours(tag_id).await?;

        Ok(TagDetail {
            tag_info,
            related_notes,
            child_tags: children,
            parent_tags: parents,
        })
    }

    pub async fn delete_tag(&self, tag_id: i64) -> Result<DeletedTagSummary> {
        self.store.tags.delete(tag_id).await
    }

    /// Create the edges named by `req` around `tag_id`.
    ///
    /// Every referenced tag is checked before anything is written, and the
    /// edges are stored all-or-none.
    pub async fn add_relation(
        &self,
        tag_id: i64,
        req: &TagRelationRequest,
    ) -> Result<Vec<TagGenealogy>> {
        self.get_tag(tag_id).await?;
        let edges = req.edges_for(tag_id)?;
        for referenced in [req.parent_id, req.child_id].into_iter().flatten() {
            self.require_referenced_tag(referenced).await?;
        }

        self.store.genealogy.add_edges(&edges).await?;
        debug!(
            subsystem = "api",
            component = "tag_graph",
            op = "add_relation",
            tag_id,
            edge_count = edges.len(),
            "Relation added"
        );
        Ok(edges)
    }

    /// Remove the edges named by `req`. Fails without removing anything if
    /// any of them is absent.
    pub async fn remove_relation(&self, tag_id: i64, req: &TagRelationRequest) -> Result<()> {
        self.get_tag(tag_id).await?;
        let edges = req.edges_for(tag_id)?;
        self.store.genealogy.remove_edges(&edges).await?;
        debug!(
            subsystem = "api",
            component = "tag_graph",
            op = "remove_relation",
            tag_id,
            edge_count = edges.len(),
            "Relation removed"
        );
        Ok(())
    }

    /// One-hop children and parents of an existing tag.
    pub async fn relations(&self, tag_id: i64) -> Result<TagRelations> {
        self.get_tag(tag_id).await?;
        self.neighbours(tag_id).await
    }

    pub(crate) async fn neighbours(&self, tag_id: i64) -> Result<TagRelations> {
        Ok(TagRelations {
            children: self.store.genealogy.children_of(tag_id).await?,
            parents: self.store.genealogy.parents_of(tag_id).await?,
        })
    }

    async fn require_referenced_tag(&self, tag_id: i64) -> Result<()> {
        if self.store.tags.exists(tag_id).await? {
            Ok(())
        } else {
            Err(Error::missing_reference(EntityKind::Tag, tag_id))
        }
    }
}
