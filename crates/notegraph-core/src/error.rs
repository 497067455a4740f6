//! Error types for notegraph.

use std::fmt;

use thiserror::Error;

/// Result type alias using notegraph's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Kind of entity named in a lookup failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    User,
    Type,
    Document,
    DocType,
    Note,
    Tag,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::User => "User",
            EntityKind::Type => "Type",
            EntityKind::Document => "Document",
            EntityKind::DocType => "DocType",
            EntityKind::Note => "Note",
            EntityKind::Tag => "Tag",
        };
        f.write_str(name)
    }
}

/// Core error type for notegraph operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource addressed by the request path not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// An id supplied in a request body names an entity that does not exist
    #[error("{entity} with ID {id} does not exist")]
    ReferenceNotFound { entity: EntityKind, id: i64 },

    /// Uniqueness invariant violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Blob storage failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a missing path resource, e.g. `Tag 7 not found`.
    pub fn not_found(entity: EntityKind, id: i64) -> Self {
        Error::NotFound(format!("{} {} not found", entity, id))
    }

    /// Shorthand for a missing entity referenced from a request body.
    pub fn missing_reference(entity: EntityKind, id: i64) -> Self {
        Error::ReferenceNotFound { entity, id }
    }

    /// True for both flavours of "entity does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::ReferenceNotFound { .. }
        )
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_not_found_helper_names_entity_and_id() {
        let err = Error::not_found(EntityKind::Tag, 7);
        assert_eq!(err.to_string(), "Not found: Tag 7 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_reference_not_found_message() {
        let err = Error::missing_reference(EntityKind::User, 999);
        assert_eq!(err.to_string(), "User with ID 999 does not exist");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_reference_not_found_doc_type() {
        let err = Error::missing_reference(EntityKind::DocType, 4);
        assert_eq!(err.to_string(), "DocType with ID 4 does not exist");
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("tag 1 already attached to note 2".to_string());
        assert_eq!(err.to_string(), "Conflict: tag 1 already attached to note 2");
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("subject must not be empty".to_string());
        assert_eq!(err.to_string(), "Invalid input: subject must not be empty");
    }

    #[test]
    fn test_error_display_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::Io(io_err);
        assert!(err.to_string().contains("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
