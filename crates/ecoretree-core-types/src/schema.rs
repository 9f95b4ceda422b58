//! Canonical schema constants for structured logging and events
//!
//! These constants keep field names consistent between the logging macros,
//! the error facility and log assertions in tests.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_SESSION_ID: &str = "session_id";

// Entity identifiers
pub const FIELD_DOCUMENT_ID: &str = "document_id";
pub const FIELD_NODE_ID: &str = "node_id";
pub const FIELD_FEATURE: &str = "feature";
pub const FIELD_OWNER_REF: &str = "owner_ref";

// Collection sizes
pub const FIELD_NODE_COUNT: &str = "node_count";
pub const FIELD_CHANGE_COUNT: &str = "change_count";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
