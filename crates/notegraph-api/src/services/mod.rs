//! Service layer for business logic.

pub mod documents;
pub mod note_query;
pub mod note_tags;
pub mod notes;
pub mod tag_graph;

pub use documents::{DocumentService, Upload};
pub use note_query::NoteQueryService;
pub use note_tags::NoteTagService;
pub use notes::NoteService;
pub use tag_graph::TagGraphService;
