//! ecoretree Core - client-side mirror of a remotely owned Ecore model
//!
//! This crate provides the synchronization kernel of the tree editor:
//! - Tree node model built from raw Ecore documents, with a round trip back
//! - Payload differ producing the change set of a local edit
//! - Edit commands, their wire form and owner path resolution
//! - Atomic application of remote commands to the tree and raw document
//! - The per-editor mirror state machine over push messages
//! - Data, schema and UI schema accessors for a detail view

pub mod apply;
pub mod builder;
pub mod codec;
pub mod commands;
pub mod diff;
pub mod errors;
pub mod label;
pub mod logging_facility;
pub mod mirror;
pub mod model;
pub mod model_service;
pub mod snapshot;

pub use ecoretree_core_types as core_types;

// Re-export commonly used types
pub use apply::apply;
pub use commands::{Command, OwnerReference};
pub use diff::{diff, ChangeSet};
pub use errors::{ExError, ExErrorKind, Result, SyncError};
pub use label::{EcoreLabelResolver, LabelResolver};
pub use mirror::{Mirror, PushMessage, PushOutcome};
pub use model::{NodeId, Payload, TreeNode};
pub use model_service::ModelService;
