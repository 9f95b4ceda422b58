//! In-memory collaborators
//!
//! [`InMemoryModelServer`] holds documents in a map, applies edits with the
//! same applier the mirror uses and echoes them to subscribers as incremental
//! updates. [`RecordingHost`] records every host notification. Both are used
//! by the tests and by the CLI replay.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use ecoretree_core::builder::build;
use ecoretree_core::mirror::PushMessage;
use ecoretree_core::{apply, Command, EcoreLabelResolver, NodeId, Result, SyncError, TreeNode};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};

use crate::ports::{EditorHost, ModelServerClient, PushStream};

#[derive(Default)]
struct ServerState {
    documents: HashMap<String, Value>,
    failures: HashMap<String, (u16, String)>,
    reject_edits: bool,
    edits: Vec<(String, Command)>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<PushMessage>>>,
    subscribe_calls: usize,
    unsubscribe_calls: usize,
}

/// Model server kept in process memory
#[derive(Default)]
pub struct InMemoryModelServer {
    state: Mutex<ServerState>,
}

impl InMemoryModelServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Store or replace a document without notifying subscribers
    pub async fn put_document(&self, document_id: &str, document: Value) {
        self.state
            .lock()
            .await
            .documents
            .insert(document_id.to_string(), document);
    }

    pub async fn document(&self, document_id: &str) -> Option<Value> {
        self.state.lock().await.documents.get(document_id).cloned()
    }

    /// Make fetches of `document_id` answer with an error status
    pub async fn fail_fetch(&self, document_id: &str, status: u16, message: &str) {
        self.state
            .lock()
            .await
            .failures
            .insert(document_id.to_string(), (status, message.to_string()));
    }

    /// Reject every edit with a transport error
    pub async fn reject_edits(&self, reject: bool) {
        self.state.lock().await.reject_edits = reject;
    }

    /// Edits received so far, in arrival order
    pub async fn edits(&self) -> Vec<(String, Command)> {
        self.state.lock().await.edits.clone()
    }

    pub async fn subscribe_calls(&self) -> usize {
        self.state.lock().await.subscribe_calls
    }

    pub async fn unsubscribe_calls(&self) -> usize {
        self.state.lock().await.unsubscribe_calls
    }

    /// Deliver a message to every subscriber of `document_id`
    ///
    /// Returns how many subscribers received it.
    pub async fn publish(&self, document_id: &str, message: PushMessage) -> usize {
        let mut state = self.state.lock().await;
        let Some(senders) = state.subscribers.get_mut(document_id) else {
            return 0;
        };
        senders.retain(|tx| tx.send(message.clone()).is_ok());
        senders.len()
    }
}

#[async_trait]
impl ModelServerClient for InMemoryModelServer {
    async fn fetch_snapshot(&self, document_id: &str) -> Result<Value> {
        let state = self.state.lock().await;
        if let Some((status, message)) = state.failures.get(document_id) {
            return Err(SyncError::Transport {
                status: *status,
                message: message.clone(),
            });
        }
        state
            .documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| SyncError::Transport {
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    async fn send_edit(&self, document_id: &str, command: &Command) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.reject_edits {
            return Err(SyncError::Transport {
                status: 500,
                message: "Internal Server Error".to_string(),
            });
        }
        state.edits.push((document_id.to_string(), command.clone()));

        let document = state
            .documents
            .get(document_id)
            .ok_or_else(|| SyncError::Transport {
                status: 404,
                message: "Not Found".to_string(),
            })?;
        let root = build(document, &EcoreLabelResolver);
        let patched = apply(&root, document, command, &EcoreLabelResolver)?;
        state
            .documents
            .insert(document_id.to_string(), patched.document);

        if let Some(senders) = state.subscribers.get_mut(document_id) {
            let update = PushMessage::IncrementalUpdate(command.to_wire());
            senders.retain(|tx| {
                tx.send(update.clone()).is_ok()
                    && tx.send(PushMessage::DirtyStateChanged(true)).is_ok()
            });
        }
        Ok(())
    }

    async fn subscribe(&self, document_id: &str) -> Result<PushStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().await;
        state.subscribe_calls += 1;
        state
            .subscribers
            .entry(document_id.to_string())
            .or_default()
            .push(tx);

        Ok(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|message| (message, rx))
        })
        .boxed())
    }

    async fn unsubscribe(&self, document_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.unsubscribe_calls += 1;
        state.subscribers.remove(document_id);
        Ok(())
    }
}

/// One notification received by [`RecordingHost`]
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    Redraw { node_count: usize },
    RefreshDetail(NodeId),
    DirtyChanged(bool),
    RenderError(String),
}

/// Editor host that records what it was told
#[derive(Default)]
pub struct RecordingHost {
    events: StdMutex<Vec<HostEvent>>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, event: HostEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl EditorHost for RecordingHost {
    fn refresh_detail(&self, node: &TreeNode) {
        self.record(HostEvent::RefreshDetail(node.id));
    }

    fn dirty_changed(&self, dirty: bool) {
        self.record(HostEvent::DirtyChanged(dirty));
    }

    fn render_error(&self, message: &str) {
        self.record(HostEvent::RenderError(message.to_string()));
    }

    fn redraw(&self, root: &TreeNode) {
        self.record(HostEvent::Redraw {
            node_count: root.node_count(),
        });
    }
}
