//! Document HTTP handlers.
//!
//! Uploads are `multipart/form-data` with a `TypeId` text field and an
//! optional `file` part. Document JSON exposes the stored file as a
//! `/documents/{filename}` path, or `null` when none was uploaded.

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use notegraph_core::{Document, EntityKind, ResourceRepository};

use super::get_resource;
use crate::services::Upload;
use crate::{ApiError, AppState};

/// Public JSON shape of a document.
#[derive(Debug, Serialize)]
pub struct DocumentView {
    pub id: i64,
    pub type_id: i64,
    pub file: Option<String>,
    pub size_bytes: Option<i64>,
    pub content_hash: Option<String>,
    pub created_at_utc: DateTime<Utc>,
}

impl From<Document> for DocumentView {
    fn from(doc: Document) -> Self {
        Self {
            file: doc.file_url(),
            id: doc.id,
            type_id: doc.type_id,
            size_bytes: doc.size_bytes,
            content_hash: doc.content_hash,
            created_at_utc: doc.created_at_utc,
        }
    }
}

pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<DocumentView>>, ApiError> {
    let documents = state.store.documents.list().await?;
    Ok(Json(documents.into_iter().map(DocumentView::from).collect()))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DocumentView>, ApiError> {
    let Json(document): Json<Document> =
        get_resource(state.store.documents.as_ref(), EntityKind::Document, id).await?;
    Ok(Json(document.into()))
}

/// Upload a document.
///
/// # Returns
/// - 201 Created with the document
/// - 400 Bad Request if `TypeId` is missing, malformed or names no doc type
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentView>), ApiError> {
    let mut type_id: Option<i64> = None;
    let mut file: Option<Upload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("TypeId") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid TypeId field: {}", e)))?;
                let parsed = raw.trim().parse::<i64>().map_err(|_| {
                    ApiError::BadRequest(format!("TypeId must be an integer, got '{}'", raw))
                })?;
                type_id = Some(parsed);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid file part: {}", e)))?;
                file = Some(Upload {
                    file_name,
                    data: data.to_vec(),
                });
            }
            _ => {}
        }
    }

    let type_id = type_id.ok_or_else(|| ApiError::BadRequest("TypeId is required".to_string()))?;
    let document = state.documents().upload(type_id, file).await?;
    Ok((StatusCode::CREATED, Json(document.into())))
}

/// Stream back the stored file as an attachment.
///
/// # Returns
/// - 200 OK with the file bytes
/// - 400 Bad Request if the document has no stored file
/// - 404 Not Found if the document does not exist
pub async fn download_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let (document, data) = state.documents().download(id).await?;
    let file_name = document.file_name.unwrap_or_else(|| "download".to_string());

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        Body::from(data),
    )
        .into_response())
}

/// Delete a document together with the notes that reference it.
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let summary = state.documents().delete(id).await?;
    info!(
        document_id = id,
        notes_removed = summary.notes_removed,
        links_removed = summary.links_removed,
        "Document deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
