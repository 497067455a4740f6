//! Note HTTP handlers, including tag attachment and the neighbourhood query.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use notegraph_core::{
    CreateNoteRequest, Note, NoteTagLink, NoteTagRequest, NoteWithTags, TagNeighborhoodNotes,
    UpdateNoteRequest,
};

use crate::{ApiError, AppJson, AppState};

pub async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.note_query().list_notes().await?))
}

/// A note with its attached tags.
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NoteWithTags>, ApiError> {
    Ok(Json(state.note_query().get_note(id).await?))
}

/// Create a note.
///
/// # Returns
/// - 201 Created with the note
/// - 400 Bad Request naming the first missing owner, type or document,
///   or the invalid field
pub async fn create_note(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let note = state.notes().create(&req).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Update `subject` and/or `payload`.
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(req): AppJson<UpdateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.notes().update(id, &req).await?))
}

pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let links_removed = state.notes().delete(id).await?;
    info!(note_id = id, links_removed, "Note deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Attach a tag to a note.
///
/// # Returns
/// - 201 Created with `{ "note_id", "tag_id" }`
/// - 400 Bad Request if the tag does not exist
/// - 404 Not Found if the note does not exist
/// - 409 Conflict if the tag is already attached
pub async fn add_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(req): AppJson<NoteTagRequest>,
) -> Result<(StatusCode, Json<NoteTagLink>), ApiError> {
    let link = state.note_tags().attach(id, req.tag_id).await?;
    Ok((StatusCode::CREATED, Json(link)))
}

/// Detach a tag from a note; 404 if it was not attached.
pub async fn remove_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(req): AppJson<NoteTagRequest>,
) -> Result<StatusCode, ApiError> {
    state.note_tags().detach(id, req.tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Notes for a tag plus the notes of its immediate children and parents.
pub async fn notes_by_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<i64>,
) -> Result<Json<TagNeighborhoodNotes>, ApiError> {
    Ok(Json(state.note_query().notes_by_tag_neighborhood(tag_id).await?))
}
