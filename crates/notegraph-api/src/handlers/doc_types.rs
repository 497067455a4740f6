//! Document type HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use notegraph_core::{CreateDocTypeRequest, DocType, DocTypeRepository, EntityKind};

use super::{get_resource, list_resource};
use crate::{ApiError, AppJson, AppState};

pub async fn list_doc_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<DocType>>, ApiError> {
    list_resource(state.store.doc_types.as_ref()).await
}

pub async fn get_doc_type(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DocType>, ApiError> {
    get_resource(state.store.doc_types.as_ref(), EntityKind::DocType, id).await
}

pub async fn create_doc_type(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateDocTypeRequest>,
) -> Result<(StatusCode, Json<DocType>), ApiError> {
    req.validate()?;
    let doc_type = state.store.doc_types.create(&req.title).await?;
    Ok((StatusCode::CREATED, Json(doc_type)))
}
