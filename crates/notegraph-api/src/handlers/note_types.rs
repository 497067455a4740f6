//! Note type HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use notegraph_core::{CreateNoteTypeRequest, EntityKind, NoteType, NoteTypeRepository};

use super::{get_resource, list_resource};
use crate::{ApiError, AppJson, AppState};

pub async fn list_note_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<NoteType>>, ApiError> {
    list_resource(state.store.note_types.as_ref()).await
}

pub async fn get_note_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<NoteType>, ApiError> {
    get_resource(state.store.note_types.as_ref(), EntityKind::Type, id).await
}

pub async fn create_note_type(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateNoteTypeRequest>,
) -> Result<(StatusCode, Json<NoteType>), ApiError> {
    req.validate()?;
    let note_type = state.store.note_types.create(&req.name).await?;
    Ok((StatusCode::CREATED, Json(note_type)))
}

/// Delete a note type. Notes of that type are kept.
pub async fn delete_note_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.note_types.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
