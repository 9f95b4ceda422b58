use ecoretree_core_types::RequestId;
use thiserror::Error;

/// Result type alias using SyncError
pub type Result<T> = std::result::Result<T, SyncError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code used in structured logs and by
/// callers that need to branch on the failure class rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Input / decoding
    InvalidInput,
    InvalidReference,
    UnparseableCommand,
    AmbiguousCommand,

    // Resolution against the mirror
    NotFound,
    OutOfRange,
    TypeMismatch,

    // Mirror lifecycle
    MirrorUnavailable,

    // Integration
    Transport,
    Subscription,
    Serialization,
    Io,
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidReference => "ERR_INVALID_REFERENCE",
            ExErrorKind::UnparseableCommand => "ERR_UNPARSEABLE_COMMAND",
            ExErrorKind::AmbiguousCommand => "ERR_AMBIGUOUS_COMMAND",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::OutOfRange => "ERR_OUT_OF_RANGE",
            ExErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            ExErrorKind::MirrorUnavailable => "ERR_MIRROR_UNAVAILABLE",
            ExErrorKind::Transport => "ERR_TRANSPORT",
            ExErrorKind::Subscription => "ERR_SUBSCRIPTION",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Classification fields for programmatic handling plus the context needed
/// to find the failing document, node or request in the logs.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    document_id: Option<String>,
    node_id: Option<String>,
    feature: Option<String>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            document_id: None,
            node_id: None,
            feature: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add document context
    pub fn with_document_id(mut self, id: impl Into<String>) -> Self {
        self.document_id = Some(id.into());
        self
    }

    /// Add node context
    pub fn with_node_id(mut self, id: impl Into<String>) -> Self {
        self.node_id = Some(id.into());
        self
    }

    /// Add feature context
    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.feature = Some(feature.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn node_id(&self) -> Option<&str> {
        self.node_id.as_deref()
    }

    pub fn feature(&self) -> Option<&str> {
        self.feature.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(document_id) = &self.document_id {
            write!(f, " (document_id: {})", document_id)?;
        }
        if let Some(node_id) = &self.node_id {
            write!(f, " (node_id: {})", node_id)?;
        }
        if let Some(feature) = &self.feature {
            write!(f, " (feature: {})", feature)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for mirror synchronization
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    // ===== Decoding =====
    /// Owner reference has no usable path suffix
    #[error("Invalid owner reference: {reference}")]
    InvalidOwnerReference { reference: String },

    /// Inbound command could not be decoded
    #[error("Unparseable command: {reason}")]
    UnparseableCommand { reason: String },

    /// Command type tag missing or unknown; the command must not be guessed
    #[error("Ambiguous command type: {type_tag:?}")]
    AmbiguousCommandType { type_tag: Option<String> },

    /// Snapshot or push message is not valid JSON for its expected shape
    #[error("Invalid snapshot: {reason}")]
    InvalidSnapshot { reason: String },

    // ===== Resolution =====
    /// No child matched a path segment while walking from the root
    #[error("Owner not found: {reference} (unmatched segment '{segment}')")]
    OwnerNotFound { reference: String, segment: String },

    /// Node id is not present in the current mirror
    #[error("Node not found: {node_id}")]
    NodeNotFound { node_id: String },

    /// Index addressed outside of a feature's value list
    #[error("Index {index} out of range for feature '{feature}' (len {len})")]
    IndexOutOfRange {
        feature: String,
        index: usize,
        len: usize,
    },

    /// Feature exists but does not hold a list
    #[error("Feature '{feature}' is not a list")]
    FeatureNotAList { feature: String },

    /// Add value is not a JSON object
    #[error("Value added to '{feature}' is not an object")]
    ValueNotAnObject { feature: String },

    // ===== Mirror lifecycle =====
    /// Incremental update arrived while no tree is loaded
    #[error("Mirror has no tree loaded")]
    MirrorEmpty,

    // ===== Integration =====
    /// Request/response failure against the model service
    #[error("Transport error (status {status}): {message}")]
    Transport { status: u16, message: String },

    /// Push channel could not be opened or closed
    #[error("Subscription error for {document_id}: {reason}")]
    Subscription { document_id: String, reason: String },

    /// Configuration could not be loaded
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<SyncError> for ExError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::InvalidOwnerReference { reference } => {
                ExError::new(ExErrorKind::InvalidReference)
                    .with_message(format!("Invalid owner reference '{}'", reference))
            }
            SyncError::UnparseableCommand { reason } => {
                ExError::new(ExErrorKind::UnparseableCommand).with_message(reason)
            }
            SyncError::AmbiguousCommandType { type_tag } => {
                ExError::new(ExErrorKind::AmbiguousCommand).with_message(match type_tag {
                    Some(tag) => format!("Unknown command type '{}'", tag),
                    None => "Command type tag is unset".to_string(),
                })
            }
            SyncError::InvalidSnapshot { reason } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(reason)
            }
            SyncError::OwnerNotFound { reference, segment } => {
                ExError::new(ExErrorKind::NotFound).with_message(format!(
                    "No node matches segment '{}' of '{}'",
                    segment, reference
                ))
            }
            SyncError::NodeNotFound { node_id } => ExError::new(ExErrorKind::NotFound)
                .with_node_id(node_id)
                .with_message("Node not found"),
            SyncError::IndexOutOfRange {
                feature,
                index,
                len,
            } => ExError::new(ExErrorKind::OutOfRange)
                .with_feature(feature)
                .with_message(format!("Index {} out of range (len {})", index, len)),
            SyncError::FeatureNotAList { feature } => ExError::new(ExErrorKind::TypeMismatch)
                .with_feature(feature)
                .with_message("Feature is not a list"),
            SyncError::ValueNotAnObject { feature } => ExError::new(ExErrorKind::TypeMismatch)
                .with_feature(feature)
                .with_message("Added value is not an object"),
            SyncError::MirrorEmpty => ExError::new(ExErrorKind::MirrorUnavailable)
                .with_message("Mirror has no tree loaded"),
            SyncError::Transport { status, message } => ExError::new(ExErrorKind::Transport)
                .with_message(format!("Status {} {}", status, message)),
            SyncError::Subscription {
                document_id,
                reason,
            } => ExError::new(ExErrorKind::Subscription)
                .with_document_id(document_id)
                .with_message(reason),
            SyncError::Config { reason } => {
                ExError::new(ExErrorKind::Config).with_message(reason)
            }
            SyncError::Serialization { message } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
            SyncError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(ExErrorKind::NotFound.code(), "ERR_NOT_FOUND");
        assert_eq!(ExErrorKind::AmbiguousCommand.code(), "ERR_AMBIGUOUS_COMMAND");
        assert_eq!(ExErrorKind::Transport.code(), "ERR_TRANSPORT");
    }

    #[test]
    fn test_owner_not_found_maps_to_not_found() {
        let err: ExError = SyncError::OwnerNotFound {
            reference: "file:/ws/m.ecore#//Missing".to_string(),
            segment: "Missing".to_string(),
        }
        .into();

        assert_eq!(err.kind(), ExErrorKind::NotFound);
        assert!(err.message().contains("Missing"));
    }

    #[test]
    fn test_unset_type_tag_message() {
        let err: ExError = SyncError::AmbiguousCommandType { type_tag: None }.into();
        assert_eq!(err.kind(), ExErrorKind::AmbiguousCommand);
        assert_eq!(err.message(), "Command type tag is unset");
    }

    #[test]
    fn test_display_includes_context() {
        let err = ExError::new(ExErrorKind::OutOfRange)
            .with_op("apply_remove")
            .with_feature("eLiterals")
            .with_message("Index 4 out of range (len 3)");

        let rendered = err.to_string();
        assert!(rendered.starts_with("[ERR_OUT_OF_RANGE] in operation 'apply_remove'"));
        assert!(rendered.contains("(feature: eLiterals)"));
    }
}
