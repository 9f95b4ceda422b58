//! Coordinator running as a task
//!
//! The editor UI talks to an [`EditorSession`] by queueing
//! [`SessionEvent`]s; the task owns the coordinator and handles events and
//! push messages one at a time. Edits and refetches complete in the
//! background.

use ecoretree_core::{NodeId, Payload, Result, SyncError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::coordinator::SyncCoordinator;

/// Capacity of the local event queue
const EVENT_QUEUE_CAPACITY: usize = 64;

/// Local event queued for the coordinator task
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The detail form of `node_id` now shows `payload`
    FormUpdate { node_id: NodeId, payload: Payload },
    Select(NodeId),
    Show,
    Hide,
    /// Release the subscription and stop the task
    Dispose,
}

/// Handle to a running coordinator
pub struct EditorSession {
    events: mpsc::Sender<SessionEvent>,
    task: JoinHandle<SyncCoordinator>,
}

impl EditorSession {
    /// Open the document and start processing on the current runtime
    ///
    /// # Errors
    ///
    /// Subscription failures from [`SyncCoordinator::open`].
    pub async fn start(mut coordinator: SyncCoordinator) -> Result<Self> {
        coordinator.open().await?;

        let (events, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let task = tokio::spawn(async move {
            coordinator.run(rx).await;
            coordinator
        });
        Ok(Self { events, task })
    }

    /// Queue an event
    ///
    /// # Errors
    ///
    /// `Internal` when the task has already stopped.
    pub async fn submit(&self, event: SessionEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|_| SyncError::Internal {
                message: "editor session has stopped".to_string(),
            })
    }

    /// Dispose and wait for the task, returning the coordinator
    ///
    /// # Errors
    ///
    /// `Internal` when the task panicked.
    pub async fn close(self) -> Result<SyncCoordinator> {
        // The task may already be gone; joining still reports its result.
        let _ = self.events.send(SessionEvent::Dispose).await;
        self.task.await.map_err(|e| SyncError::Internal {
            message: format!("editor session task failed: {}", e),
        })
    }
}
