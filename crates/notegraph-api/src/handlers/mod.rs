//! HTTP handlers for notegraph-api.
//!
//! Plain reference resources (note types, doc types) are served through the
//! generic [`list_resource`] and [`get_resource`] helpers over
//! [`ResourceRepository`].

pub mod doc_types;
pub mod documents;
pub mod note_types;
pub mod notes;
pub mod tags;

use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use notegraph_core::{EntityKind, Error, ResourceRepository};

use crate::ApiError;

/// Serve every record of a resource, ordered by id.
pub(crate) async fn list_resource<T, R>(repo: &R) -> Result<Json<Vec<T>>, ApiError>
where
    R: ResourceRepository<T> + ?Sized,
    T: Serialize,
{
    Ok(Json(repo.list().await?))
}

/// Serve one record of a resource, 404 if absent.
pub(crate) async fn get_resource<T, R>(
    repo: &R,
    kind: EntityKind,
    id: i64,
) -> Result<Json<T>, ApiError>
where
    R: ResourceRepository<T> + ?Sized,
    T: Serialize,
{
    repo.get(id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found(kind, id).into())
}

/// Liveness probe.
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
