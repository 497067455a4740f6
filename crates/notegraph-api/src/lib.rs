//! # notegraph-api
//!
//! HTTP API for notegraph: tags arranged in a parent/child graph, notes
//! linked to tags, and the documents and types notes refer to.
//!
//! The binary in `main.rs` wires configuration, logging and the database;
//! this library holds the router so tests can drive it in-process.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod services;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method, Request},
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{MakeSpan, TraceLayer},
};
use tracing::Span;
use uuid::Uuid;

use notegraph_core::{logging, Store};
use notegraph_db::StorageBackend;

pub use config::ServerConfig;
pub use error::ApiError;
pub use extract::AppJson;

use services::{DocumentService, NoteQueryService, NoteService, NoteTagService, TagGraphService};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Request span carrying the correlation id set by [`MakeRequestUuidV7`].
#[derive(Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let span = tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = tracing::field::Empty,
            result_count = tracing::field::Empty,
        );
        if let Some(id) = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
        {
            span.record(logging::REQUEST_ID, id);
        }
        span
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Shared handler state. Cloning only bumps reference counts.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub blobs: Arc<dyn StorageBackend>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Store, blobs: Arc<dyn StorageBackend>, config: ServerConfig) -> Self {
        Self {
            store,
            blobs,
            config: Arc::new(config),
        }
    }

    pub fn tag_graph(&self) -> TagGraphService {
        TagGraphService::new(self.store.clone())
    }

    pub fn note_tags(&self) -> NoteTagService {
        NoteTagService::new(self.store.clone())
    }

    pub fn note_query(&self) -> NoteQueryService {
        NoteQueryService::new(self.store.clone())
    }

    pub fn notes(&self) -> NoteService {
        NoteService::new(self.store.clone())
    }

    pub fn documents(&self) -> DocumentService {
        DocumentService::new(self.store.clone(), self.blobs.clone())
    }
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the full application router with middleware.
pub fn router(state: AppState) -> Router {
    use handlers::{doc_types, documents, note_types, notes, tags};

    let api = Router::new()
        .route("/health", get(handlers::health_check))
        // Tags
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/tags/counts", get(tags::tag_counts))
        .route(
            "/tags/:id",
            get(tags::get_tag)
                .patch(tags::add_relation)
                .delete(tags::delete_tag),
        )
        .route(
            "/tags/:id/relations",
            get(tags::get_relations)
                .patch(tags::add_relation)
                .delete(tags::remove_relation),
        )
        // Notes
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/:id",
            get(notes::get_note)
                .patch(notes::update_note)
                .delete(notes::delete_note),
        )
        .route("/notes/:id/add_tag", post(notes::add_tag))
        .route("/notes/:id/remove_tag", delete(notes::remove_tag))
        .route("/notes/by_tag/:tag_id", get(notes::notes_by_tag))
        // Note types
        .route(
            "/types",
            get(note_types::list_note_types).post(note_types::create_note_type),
        )
        .route(
            "/types/:id",
            get(note_types::get_note_type).delete(note_types::delete_note_type),
        )
        // Document types
        .route(
            "/doctypes",
            get(doc_types::list_doc_types).post(doc_types::create_doc_type),
        )
        .route("/doctypes/:id", get(doc_types::get_doc_type))
        // Documents
        .route(
            "/documents",
            get(documents::list_documents).post(documents::upload_document),
        )
        .route(
            "/documents/:id",
            get(documents::get_document).delete(documents::delete_document),
        )
        .route("/documents/:id/download", get(documents::download_document));

    let max_upload_bytes = state.config.max_upload_bytes;
    let allowed_origins = state.config.allowed_origins.clone();

    Router::new()
        .nest("/api/v1", api)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http().make_span_with(RequestSpan))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .max_age(std::time::Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .with_state(state)
}
