//! Payload change differ.
//!
//! Computes the fields of a node payload that differ from the last payload
//! acknowledged by the model server.
//!
//! ## Entry point
//!
//! ```
//! use ecoretree_core::diff::diff;
//! use serde_json::json;
//!
//! let baseline = json!({"name": "Book", "abstract": false});
//! let current = json!({"name": "Book", "abstract": true});
//! let changes = diff(current.as_object().unwrap(), baseline.as_object().unwrap());
//! assert_eq!(changes.first_field(), Some("abstract"));
//! ```
//!
//! ## Guarantees
//!
//! - **Idempotence**: `diff(p, p)` is empty for every payload `p`.
//! - **Order**: changes are reported in the field order of `current`.
//! - **Exclusions**: type discriminators, identity and link anchors are never
//!   reported, at any depth.

pub mod engine;
pub mod model;

pub use engine::diff;
pub use model::ChangeSet;
