//! Snapshot bookkeeping.
//!
//! ## Responsibilities
//!
//! - Compute content digests of raw documents
//! - Record when and from what the mirror was last synchronized
//!
//! ## Non-Responsibilities
//!
//! - Fetching snapshots (handled by `ecoretree-engine`)

pub mod digest;

pub use digest::compute_document_digest;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last synchronization point of a mirror
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPoint {
    /// Digest of the document after the last applied change
    pub digest: String,
    pub synced_at: DateTime<Utc>,
    pub node_count: usize,
}
