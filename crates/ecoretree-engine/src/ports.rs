//! Collaborator ports
//!
//! The engine never talks to a network or a widget toolkit directly. A host
//! application supplies a [`ModelServerClient`] for the authoritative copy and
//! an [`EditorHost`] for everything the user sees.

use async_trait::async_trait;
use ecoretree_core::{Command, Result, TreeNode};
use futures::stream::BoxStream;
use serde_json::Value;

use ecoretree_core::mirror::PushMessage;

/// Ordered stream of push messages for one document
pub type PushStream = BoxStream<'static, PushMessage>;

/// Request/response and push access to the model server
///
/// Failures of `fetch_snapshot` carry the response status as
/// `SyncError::Transport`.
#[async_trait]
pub trait ModelServerClient: Send + Sync {
    /// Fetch the whole document
    async fn fetch_snapshot(&self, document_id: &str) -> Result<Value>;

    /// Submit one edit command
    async fn send_edit(&self, document_id: &str, command: &Command) -> Result<()>;

    /// Open the push channel for a document
    async fn subscribe(&self, document_id: &str) -> Result<PushStream>;

    /// Close the push channel for a document
    async fn unsubscribe(&self, document_id: &str) -> Result<()>;
}

/// Editor surface notified by the coordinator
pub trait EditorHost: Send + Sync {
    /// The selected node's payload changed
    fn refresh_detail(&self, node: &TreeNode);

    fn dirty_changed(&self, dirty: bool);

    /// Show an inline error instead of the tree
    fn render_error(&self, message: &str);

    /// The tree changed and should be drawn again
    fn redraw(&self, root: &TreeNode);
}
