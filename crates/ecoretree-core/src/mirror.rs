//! Per-editor mirror of a remote document
//!
//! The mirror owns the raw document, the tree built from it, the selection and
//! the editor flags the host cares about (dirty, visible, refresh pending).
//! It is changed only through [`Mirror::handle_push`], [`Mirror::refresh`] and
//! the selection/visibility hooks. Every change is computed on copies and
//! swapped in whole, so a failed message leaves the last good state in place.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::apply::apply;
use crate::builder::build;
use crate::commands::Command;
use crate::errors::{Result, SyncError};
use crate::label::LabelResolver;
use crate::model::{NodeId, TreeNode};
use crate::snapshot::{compute_document_digest, SyncPoint};
use crate::{log_op_end, log_op_error, log_op_start};

/// Message delivered on the push channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum PushMessage {
    /// Whole document replacing the mirror
    FullUpdate(Value),
    /// One command in wire form
    IncrementalUpdate(Value),
    #[serde(rename = "dirtyState")]
    DirtyStateChanged(bool),
}

impl PushMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            PushMessage::FullUpdate(_) => "fullUpdate",
            PushMessage::IncrementalUpdate(_) => "incrementalUpdate",
            PushMessage::DirtyStateChanged(_) => "dirtyState",
        }
    }
}

/// What handling a push message did
#[derive(Debug, Clone, PartialEq)]
pub enum PushOutcome {
    /// Tree rebuilt from a snapshot
    Rebuilt {
        selection_restored: bool,
        /// Editor is visible and should redraw now
        redraw: bool,
    },
    /// Command applied to the tree
    Patched {
        /// The selected node's payload changed
        refresh_detail: bool,
        /// Nodes whose form data changed
        touched: Vec<NodeId>,
    },
    /// Command type could not be determined; refetch the whole document
    ResyncRequired,
    /// Message dropped; mirror unchanged
    Dropped(SyncError),
    DirtyChanged(bool),
}

/// Result of reloading a fetched snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { selection_restored: bool },
    /// Snapshot equals the current document
    Unchanged,
}

#[derive(Debug, Clone)]
struct Loaded {
    document: Value,
    root: TreeNode,
}

/// Client-side state of one open document
pub struct Mirror {
    document_id: String,
    labels: Arc<dyn LabelResolver>,
    loaded: Option<Loaded>,
    error: Option<String>,
    selection: Option<NodeId>,
    dirty: bool,
    visible: bool,
    refresh_pending: bool,
    sync_point: Option<SyncPoint>,
}

impl Mirror {
    /// Create an empty, visible mirror
    pub fn new(document_id: impl Into<String>, labels: Arc<dyn LabelResolver>) -> Self {
        Self {
            document_id: document_id.into(),
            labels,
            loaded: None,
            error: None,
            selection: None,
            dirty: false,
            visible: true,
            refresh_pending: false,
            sync_point: None,
        }
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn labels(&self) -> &dyn LabelResolver {
        self.labels.as_ref()
    }

    pub fn document(&self) -> Option<&Value> {
        self.loaded.as_ref().map(|l| &l.document)
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.loaded.as_ref().map(|l| &l.root)
    }

    pub fn node(&self, id: &NodeId) -> Option<&TreeNode> {
        self.root().and_then(|root| root.find(id))
    }

    /// Inline error shown instead of the tree
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn refresh_pending(&self) -> bool {
        self.refresh_pending
    }

    pub fn sync_point(&self) -> Option<&SyncPoint> {
        self.sync_point.as_ref()
    }

    pub fn selection(&self) -> Option<NodeId> {
        self.selection
    }

    pub fn selected_node(&self) -> Option<&TreeNode> {
        self.selection.and_then(|id| self.node(&id))
    }

    /// Select a node; returns false when the id is not in the tree
    pub fn select(&mut self, id: &NodeId) -> bool {
        if self.node(id).is_none() {
            return false;
        }
        self.selection = Some(*id);
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Display names from below the root down to the selected node
    pub fn selected_path(&self) -> Vec<String> {
        match (self.root(), self.selection) {
            (Some(root), Some(id)) => root.ancestor_names(&id).unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Select the node reached by an exact display-name chain
    ///
    /// Clears the selection when the chain is empty or does not match.
    pub fn select_path(&mut self, path: &[String]) -> bool {
        let found = if path.is_empty() {
            None
        } else {
            self.root()
                .and_then(|root| root.find_by_names(path))
                .map(|node| node.id)
        };
        self.selection = found;
        found.is_some()
    }

    /// Editor became visible; returns true when a deferred refresh is due
    pub fn show(&mut self) -> bool {
        self.visible = true;
        std::mem::take(&mut self.refresh_pending)
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn set_dirty(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    /// Replace the error state and the tree with an inline error
    pub fn fail(&mut self, message: impl Into<String>) {
        self.loaded = None;
        self.selection = None;
        self.sync_point = None;
        self.error = Some(message.into());
    }

    /// Load a fetched snapshot, restoring the selection at `path`
    ///
    /// A snapshot equal to the current document is ignored.
    ///
    /// # Errors
    ///
    /// `InvalidSnapshot` when the snapshot is not a JSON object.
    pub fn refresh(&mut self, snapshot: Value, path: &[String]) -> Result<LoadOutcome> {
        if self.document() == Some(&snapshot) {
            return Ok(LoadOutcome::Unchanged);
        }
        let selection_restored = self.rebuild(snapshot, path)?;
        Ok(LoadOutcome::Loaded { selection_restored })
    }

    /// Rebuild from a snapshot and restore the current selection by name
    ///
    /// # Errors
    ///
    /// `InvalidSnapshot` when the snapshot is not a JSON object.
    pub fn replace(&mut self, snapshot: Value) -> Result<bool> {
        let path = self.selected_path();
        self.rebuild(snapshot, &path)
    }

    fn rebuild(&mut self, snapshot: Value, path: &[String]) -> Result<bool> {
        if !snapshot.is_object() {
            return Err(SyncError::InvalidSnapshot {
                reason: "snapshot is not a JSON object".to_string(),
            });
        }
        let root = build(&snapshot, self.labels.as_ref());
        let sync_point = sync_point(&snapshot, &root)?;

        self.loaded = Some(Loaded {
            document: snapshot,
            root,
        });
        self.error = None;
        self.sync_point = Some(sync_point);
        if !self.visible {
            self.refresh_pending = true;
        }
        Ok(self.select_path(path))
    }

    /// Apply a decoded command
    ///
    /// Returns [`PushOutcome::Patched`] listing the nodes whose data changed.
    ///
    /// # Errors
    ///
    /// `MirrorEmpty` when nothing is loaded, or any resolution error from
    /// [`apply`]. The mirror is unchanged on error.
    pub fn apply_command(&mut self, cmd: &Command) -> Result<PushOutcome> {
        let loaded = self.loaded.as_ref().ok_or(SyncError::MirrorEmpty)?;
        let patched = apply(&loaded.root, &loaded.document, cmd, self.labels.as_ref())?;
        let sync_point = sync_point(&patched.document, &patched.root)?;

        let refresh_detail = self
            .selection
            .map(|id| patched.touched.contains(&id))
            .unwrap_or(false);
        if let Some(id) = self.selection {
            if patched.removed.contains(&id) {
                self.selection = None;
            }
        }
        self.loaded = Some(Loaded {
            document: patched.document,
            root: patched.root,
        });
        self.sync_point = Some(sync_point);
        Ok(PushOutcome::Patched {
            refresh_detail,
            touched: patched.touched,
        })
    }

    /// Handle one push message
    ///
    /// Never fails: errors are logged and reported as `Dropped`, ambiguous
    /// commands as `ResyncRequired`.
    pub fn handle_push(&mut self, message: PushMessage) -> PushOutcome {
        let kind = message.kind();
        log_op_start!("handle_push", document_id = %self.document_id, push = kind);
        let start = Instant::now();

        let result = match message {
            PushMessage::DirtyStateChanged(dirty) => {
                self.dirty = dirty;
                Ok(PushOutcome::DirtyChanged(dirty))
            }
            PushMessage::FullUpdate(snapshot) => self.replace(snapshot).map(|selection_restored| {
                PushOutcome::Rebuilt {
                    selection_restored,
                    redraw: self.visible,
                }
            }),
            PushMessage::IncrementalUpdate(wire) => match Command::from_wire(&wire) {
                Err(SyncError::AmbiguousCommandType { type_tag }) => {
                    warn!(
                        document_id = %self.document_id,
                        type_tag = ?type_tag,
                        "ambiguous command type, full resync required"
                    );
                    Ok(PushOutcome::ResyncRequired)
                }
                Err(err) => Err(err),
                Ok(cmd) => {
                    debug!(command = cmd.kind(), feature = ?cmd.feature(), "applying command");
                    self.apply_command(&cmd)
                }
            },
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match result {
            Ok(outcome) => {
                log_op_end!(
                    "handle_push",
                    duration_ms = duration_ms,
                    document_id = %self.document_id,
                    node_count = self.root().map(TreeNode::node_count).unwrap_or(0)
                );
                outcome
            }
            Err(err) => {
                log_op_error!(
                    "handle_push",
                    err.clone(),
                    duration_ms = duration_ms,
                    document_id = %self.document_id,
                    push = kind
                );
                PushOutcome::Dropped(err)
            }
        }
    }
}

fn sync_point(document: &Value, root: &TreeNode) -> Result<SyncPoint> {
    Ok(SyncPoint {
        digest: compute_document_digest(document)?,
        synced_at: Utc::now(),
        node_count: root.node_count(),
    })
}
