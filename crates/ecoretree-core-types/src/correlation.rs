//! Correlation types for request tracking
//!
//! An editor session owns one [`SessionId`]; every request it issues to the
//! model service (snapshot fetch, edit transmission) carries a fresh
//! [`RequestId`] so that log lines for one round trip can be grouped.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single outbound request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new RequestId using UUIDv7 (time ordered)
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one open editor instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Context carried through one synchronization round trip
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub session_id: SessionId,
    pub document_id: String,
    pub request_id: RequestId,
}

impl SyncContext {
    /// Create a context for a new request within a session
    pub fn new(session_id: SessionId, document_id: impl Into<String>) -> Self {
        Self {
            session_id,
            document_id: document_id.into(),
            request_id: RequestId::new(),
        }
    }

    /// Same session and document, fresh request id
    pub fn next_request(&self) -> Self {
        Self {
            session_id: self.session_id.clone(),
            document_id: self.document_id.clone(),
            request_id: RequestId::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_generation() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();

        assert_ne!(id1, id2);
        assert!(!id1.as_str().is_empty());
    }

    #[test]
    fn test_request_id_display() {
        let id = RequestId::new();
        assert_eq!(format!("{}", id), id.as_str());
    }

    #[test]
    fn test_next_request_keeps_session() {
        let ctx = SyncContext::new(SessionId::new(), "model.ecore");
        let next = ctx.next_request();

        assert_eq!(ctx.session_id, next.session_id);
        assert_eq!(next.document_id, "model.ecore");
        assert_ne!(ctx.request_id, next.request_id);
    }

    #[test]
    fn test_serialization() {
        let id = RequestId::new();
        let json = serde_json::to_string(&id).unwrap();
        let deserialized: RequestId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}
