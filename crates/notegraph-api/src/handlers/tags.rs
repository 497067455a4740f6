//! Tag HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use notegraph_core::{
    logging, CreateTagRequest, Tag, TagDetail, TagNoteCount, TagRelationRequest, TagRelations,
    TagWithCount,
};

use crate::{ApiError, AppJson, AppState};

/// List all tags with their note counts.
pub async fn list_tags(
    State(state): State<AppState>,
) -> Result<Json<Vec<TagWithCount>>, ApiError> {
    Ok(Json(state.tag_graph().list_tags_with_counts().await?))
}

/// Create a tag.
///
/// # Returns
/// - 201 Created with the tag
/// - 400 Bad Request if the title is empty or too long
pub async fn create_tag(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateTagRequest>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let tag = state.tag_graph().create_tag(&req).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// Tag with its linked notes and one-hop neighbours.
pub async fn get_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TagDetail>, ApiError> {
    Ok(Json(state.tag_graph().tag_detail(id).await?))
}

/// Delete a tag, its note links and its genealogy edges.
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let summary = state.tag_graph().delete_tag(id).await?;
    info!(
        tag_id = id,
        links_removed = summary.links_removed,
        edges_removed = summary.edges_removed,
        "Tag deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// Add a parent and/or child edge around a tag.
///
/// # Returns
/// - 200 OK with `{ "status": "relation added", "edges": [...] }`
/// - 400 Bad Request if neither id is given or a referenced tag is missing
/// - 404 Not Found if the tag itself is missing
/// - 409 Conflict if an edge already exists
pub async fn add_relation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(req): AppJson<TagRelationRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let edges = state.tag_graph().add_relation(id, &req).await?;
    Ok(Json(serde_json::json!({
        "status": "relation added",
        "edges": edges,
    })))
}

/// Remove a parent and/or child edge around a tag.
pub async fn remove_relation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    AppJson(req): AppJson<TagRelationRequest>,
) -> Result<StatusCode, ApiError> {
    state.tag_graph().remove_relation(id, &req).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// One-hop children and parents of a tag.
pub async fn get_relations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<TagRelations>, ApiError> {
    Ok(Json(state.tag_graph().relations(id).await?))
}

/// Note counts for every tag in use, most used first.
pub async fn tag_counts(
    State(state): State<AppState>,
) -> Result<Json<Vec<TagNoteCount>>, ApiError> {
    let counts = state.note_tags().counts().await?;
    tracing::Span::current().record(logging::RESULT_COUNT, counts.len() as u64);
    Ok(Json(counts))
}
