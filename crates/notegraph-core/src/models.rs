//! Core data models for notegraph.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults::validate_short_text;
use crate::error::{Error, Result};

// =============================================================================
// TAG TYPES
// =============================================================================

/// A tag that can be attached to notes and arranged in a parent/child graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    pub id: i64,
    pub title: String,
}

/// A genealogy edge: `parent_id` sits one level above `child_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagGenealogy {
    pub child_id: i64,
    pub parent_id: i64,
}

impl TagGenealogy {
    pub fn new(child_id: i64, parent_id: i64) -> Self {
        Self {
            child_id,
            parent_id,
        }
    }
}

/// Link between a note and a tag (unique per pair).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteTagLink {
    pub note_id: i64,
    pub tag_id: i64,
}

/// Number of distinct notes attached to a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagNoteCount {
    pub tag_id: i64,
    pub count: i64,
}

/// Order counts by descending count, ties by ascending tag id.
pub fn sort_tag_counts(counts: &mut [TagNoteCount]) {
    counts.sort_by(|a, b| b.count.cmp(&a.count).then(a.tag_id.cmp(&b.tag_id)));
}

/// A tag annotated with its usage count, as served by the tag listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagWithCount {
    #[serde(flatten)]
    pub tag: Tag,
    pub tag_note_sub_count: i64,
}

/// One-hop neighbours of a tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRelations {
    pub children: Vec<Tag>,
    pub parents: Vec<Tag>,
}

/// Minimal note reference used in tag detail views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRef {
    pub id: i64,
    pub subject: String,
}

/// Tag with its directly linked notes and one-hop neighbours.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDetail {
    pub tag_info: Tag,
    pub related_notes: Vec<NoteRef>,
    pub child_tags: Vec<Tag>,
    pub parent_tags: Vec<Tag>,
}

/// Records removed together with a tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedTagSummary {
    pub links_removed: u64,
    pub edges_removed: u64,
}

/// Request body for creating a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTagRequest {
    pub title: String,
}

impl CreateTagRequest {
    pub fn validate(&self) -> Result<()> {
        validate_short_text("title", &self.title)
    }
}

/// Request body naming a parent and/or child for a tag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TagRelationRequest {
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub child_id: Option<i64>,
}

impl TagRelationRequest {
    /// Expand into the edges this request describes for `tag_id`.
    ///
    /// The parent edge (if any) comes first.
    pub fn edges_for(&self, tag_id: i64) -> Result<Vec<TagGenealogy>> {
        let mut edges = Vec::with_capacity(2);
        if let Some(parent_id) = self.parent_id {
            edges.push(TagGenealogy::new(tag_id, parent_id));
        }
        if let Some(child_id) = self.child_id {
            edges.push(TagGenealogy::new(child_id, tag_id));
        }
        if edges.is_empty() {
            return Err(Error::InvalidInput(
                "at least one of parent_id or child_id is required".to_string(),
            ));
        }
        Ok(edges)
    }
}

// =============================================================================
// NOTE TYPES
// =============================================================================

/// A typed text payload owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: i64,
    pub created_at_utc: DateTime<Utc>,
    pub owner_id: i64,
    pub subject: String,
    pub document_id: Option<i64>,
    pub type_id: i64,
    pub payload: String,
}

impl Note {
    pub fn to_ref(&self) -> NoteRef {
        NoteRef {
            id: self.id,
            subject: self.subject.clone(),
        }
    }
}

/// Note kind reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct NoteType {
    pub id: i64,
    pub name: String,
}

/// Note with the tags attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteWithTags {
    pub note_info: Note,
    pub related_tags: Vec<Tag>,
}

/// Notes for a tag plus notes for each of its immediate neighbours.
///
/// Neighbours without notes are present with an empty list. A note may appear
/// in several buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagNeighborhoodNotes {
    pub notes: Vec<Note>,
    #[serde(rename = "notes_child")]
    pub notes_by_child_tag: BTreeMap<i64, Vec<Note>>,
    #[serde(rename = "notes_parent")]
    pub notes_by_parent_tag: BTreeMap<i64, Vec<Note>>,
}

/// Request body for creating a note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub owner_id: i64,
    #[serde(default)]
    pub document_id: Option<i64>,
    pub type_id: i64,
    pub subject: String,
    pub payload: String,
}

impl CreateNoteRequest {
    /// Field-shape checks only; referenced ids are resolved by the caller.
    pub fn validate(&self) -> Result<()> {
        validate_short_text("subject", &self.subject)
    }
}

/// Partial update of the mutable note fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub payload: Option<String>,
}

impl UpdateNoteRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(subject) = &self.subject {
            validate_short_text("subject", subject)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.subject.is_none() && self.payload.is_none()
    }
}

/// Request body for attaching or detaching a tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct NoteTagRequest {
    pub tag_id: i64,
}

/// Request body for creating a note type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteTypeRequest {
    pub name: String,
}

impl CreateNoteTypeRequest {
    pub fn validate(&self) -> Result<()> {
        validate_short_text("name", &self.name)
    }
}

// =============================================================================
// DOCUMENT TYPES
// =============================================================================

/// Document kind reference table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocType {
    pub id: i64,
    pub title: String,
}

/// Request body for creating a doc type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocTypeRequest {
    pub title: String,
}

impl CreateDocTypeRequest {
    pub fn validate(&self) -> Result<()> {
        validate_short_text("title", &self.title)
    }
}

/// An uploaded document. The binary content lives in the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Document {
    pub id: i64,
    pub type_id: i64,
    pub file_name: Option<String>,
    #[serde(skip_serializing)]
    pub storage_path: Option<String>,
    pub size_bytes: Option<i64>,
    pub content_hash: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

impl Document {
    /// Public path of the stored file, e.g. `/documents/report.pdf`.
    pub fn file_url(&self) -> Option<String> {
        self.file_name
            .as_deref()
            .map(|name| format!("/documents/{}", name))
    }
}

/// Blob metadata recorded for an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    pub storage_path: String,
    pub size_bytes: i64,
    pub content_hash: String,
}

/// Insert request for a document row.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub type_id: i64,
    pub file: Option<StoredFile>,
}

/// Records removed together with a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedDocumentSummary {
    pub notes_removed: u64,
    pub links_removed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_note(id: i64) -> Note {
        Note {
            id,
            created_at_utc: Utc::now(),
            owner_id: 1,
            subject: format!("note {}", id),
            document_id: None,
            type_id: 1,
            payload: "body".to_string(),
        }
    }

    #[test]
    fn test_relation_request_parent_only() {
        let req = TagRelationRequest {
            parent_id: Some(1),
            child_id: None,
        };
        let edges = req.edges_for(2).unwrap();
        assert_eq!(edges, vec![TagGenealogy::new(2, 1)]);
    }

    #[test]
    fn test_relation_request_both_ids() {
        let req = TagRelationRequest {
            parent_id: Some(1),
            child_id: Some(3),
        };
        let edges = req.edges_for(2).unwrap();
        assert_eq!(edges, vec![TagGenealogy::new(2, 1), TagGenealogy::new(3, 2)]);
    }

    #[test]
    fn test_relation_request_requires_an_id() {
        let err = TagRelationRequest::default().edges_for(2).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_relation_request_allows_self_loop() {
        let req = TagRelationRequest {
            parent_id: Some(5),
            child_id: None,
        };
        assert_eq!(req.edges_for(5).unwrap(), vec![TagGenealogy::new(5, 5)]);
    }

    #[test]
    fn test_sort_tag_counts_desc_then_id() {
        let mut counts = vec![
            TagNoteCount { tag_id: 3, count: 1 },
            TagNoteCount { tag_id: 2, count: 5 },
            TagNoteCount { tag_id: 1, count: 1 },
            TagNoteCount { tag_id: 4, count: 5 },
        ];
        sort_tag_counts(&mut counts);
        let order: Vec<i64> = counts.iter().map(|c| c.tag_id).collect();
        assert_eq!(order, vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_tag_with_count_serializes_flat() {
        let value = serde_json::to_value(TagWithCount {
            tag: Tag {
                id: 1,
                title: "rust".to_string(),
            },
            tag_note_sub_count: 0,
        })
        .unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": 1, "title": "rust", "tag_note_sub_count": 0})
        );
    }

    #[test]
    fn test_neighborhood_serializes_wire_names() {
        let mut result = TagNeighborhoodNotes::default();
        result.notes_by_child_tag.insert(7, vec![sample_note(1)]);
        result.notes_by_parent_tag.insert(9, vec![]);
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["notes"], serde_json::json!([]));
        assert_eq!(value["notes_child"]["7"][0]["id"], 1);
        assert_eq!(value["notes_parent"]["9"], serde_json::json!([]));
    }

    #[test]
    fn test_create_note_request_document_optional() {
        let req: CreateNoteRequest = serde_json::from_value(serde_json::json!({
            "owner_id": 1,
            "type_id": 2,
            "subject": "hello",
            "payload": "world"
        }))
        .unwrap();
        assert_eq!(req.document_id, None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_update_note_request_rejects_blank_subject() {
        let req = UpdateNoteRequest {
            subject: Some(String::new()),
            payload: None,
        };
        assert!(req.validate().is_err());
        assert!(!req.is_empty());
        assert!(UpdateNoteRequest::default().is_empty());
    }

    #[test]
    fn test_document_hides_storage_path() {
        let doc = Document {
            id: 1,
            type_id: 2,
            file_name: Some("report.pdf".to_string()),
            storage_path: Some("documents/ab/cd/x.bin".to_string()),
            size_bytes: Some(3),
            content_hash: Some("blake3:00".to_string()),
            created_at_utc: Utc::now(),
        };
        let value = serde_json::to_value(&doc).unwrap();
        assert!(value.get("storage_path").is_none());
        assert_eq!(doc.file_url().as_deref(), Some("/documents/report.pdf"));
    }
}
