//! Structured logging field name constants for notegraph.
//!
//! All crates use these names for structured `tracing` fields so that log
//! aggregation can query the same keys across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Request failed on our side (5xx), storage unavailable |
//! | WARN  | Rejected request (4xx), config value fell back to default |
//! | INFO  | Lifecycle events (startup, migrations, shutdown) |
//! | DEBUG | Writes and their effects (rows inserted/removed) |
//! | TRACE | Per-item iteration in fan-out queries |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated from the `x-request-id` header. UUIDv7.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event: "api", "db", "storage".
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem, e.g. "pool", "tags", "genealogy".
pub const COMPONENT: &str = "component";

/// Logical operation name, e.g. "delete", "add_edges".
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

pub const TAG_ID: &str = "tag_id";
pub const NOTE_ID: &str = "note_id";
pub const DOCUMENT_ID: &str = "document_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of rows removed by a cascading delete.
pub const ROWS_REMOVED: &str = "rows_removed";
