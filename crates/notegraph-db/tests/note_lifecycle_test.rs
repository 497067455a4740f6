//! Integration tests for notes, note types and documents.
//!
//! Run with a migrated database:
//! `DATABASE_URL=... cargo test -p notegraph-db -- --ignored`

use notegraph_db::test_fixtures::{connect_test_database, provision_test_user};
use notegraph_db::{
    CreateNoteRequest, Database, DocTypeRepository, DocumentRepository, EntityKind, Error,
    NewDocument, NoteRepository, NoteTagRepository, NoteTypeRepository, ResourceRepository,
    TagRepository, UpdateNoteRequest, UserDirectory,
};

async fn setup_test_db() -> Database {
    connect_test_database()
        .await
        .expect("Failed to connect to test database")
}

fn note_request(owner_id: i64, type_id: i64, document_id: Option<i64>) -> CreateNoteRequest {
    CreateNoteRequest {
        owner_id,
        document_id,
        type_id,
        subject: "lifecycle".to_string(),
        payload: "first draft".to_string(),
    }
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_note_update_and_delete() {
    let db = setup_test_db().await;
    let owner = provision_test_user(&db.users).await.unwrap();
    assert!(db.users.user_exists(owner).await.unwrap());
    let note_type = db.note_types.create("memo").await.unwrap();
    let tag = db.tags.create("lifecycle").await.unwrap();

    let note = db
        .notes
        .insert(&note_request(owner, note_type.id, None))
        .await
        .unwrap();
    db.note_tags.attach(note.id, tag.id).await.unwrap();

    let updated = db
        .notes
        .update(
            note.id,
            &UpdateNoteRequest {
                subject: None,
                payload: Some("second draft".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.subject, "lifecycle");
    assert_eq!(updated.payload, "second draft");
    assert_eq!(updated.created_at_utc, note.created_at_utc);

    let links_removed = db.notes.delete(note.id).await.unwrap();
    assert_eq!(links_removed, 1);
    assert!(db.notes.get(note.id).await.unwrap().is_none());
    assert!(db.tags.exists(tag.id).await.unwrap());

    let err = db.notes.delete(note.id).await.unwrap_err();
    assert!(err.is_not_found());

    db.tags.delete(tag.id).await.unwrap();
    db.note_types.delete(note_type.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_note_type_delete_leaves_notes() {
    let db = setup_test_db().await;
    let owner = provision_test_user(&db.users).await.unwrap();
    let note_type = db.note_types.create("transient").await.unwrap();
    let note = db
        .notes
        .insert(&note_request(owner, note_type.id, None))
        .await
        .unwrap();

    db.note_types.delete(note_type.id).await.unwrap();
    let kept = db.notes.get(note.id).await.unwrap().unwrap();
    assert_eq!(kept.type_id, note_type.id);

    let err = db.note_types.delete(note_type.id).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        Error::not_found(EntityKind::Type, note_type.id).to_string()
    );

    db.notes.delete(note.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_document_delete_removes_notes_and_links() {
    let db = setup_test_db().await;
    let owner = provision_test_user(&db.users).await.unwrap();
    let doc_type = db.doc_types.create("scan").await.unwrap();
    let document = db
        .documents
        .insert(NewDocument {
            type_id: doc_type.id,
            file: None,
        })
        .await
        .unwrap();
    let tag = db.tags.create("scanned").await.unwrap();
    let note = db
        .notes
        .insert(&note_request(owner, 1, Some(document.id)))
        .await
        .unwrap();
    db.note_tags.attach(note.id, tag.id).await.unwrap();

    let (removed, summary) = db.documents.delete(document.id).await.unwrap();
    assert_eq!(removed.id, document.id);
    assert_eq!(summary.notes_removed, 1);
    assert_eq!(summary.links_removed, 1);
    assert!(!db.notes.exists(note.id).await.unwrap());

    db.tags.delete(tag.id).await.unwrap();
}

#[tokio::test]
#[ignore = "requires migrated database"]
async fn test_note_with_unknown_owner_is_rejected() {
    let db = setup_test_db().await;
    let result = db.notes.insert(&note_request(i64::MAX, 1, None)).await;
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}
