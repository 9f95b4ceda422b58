//! Push channel lifecycle
//!
//! [`SubscriptionManager`] keeps at most one server subscription per document
//! id. Subscribing or unsubscribing twice is a no-op. A
//! [`SubscriptionLease`] ties the subscription to a scope: it is released
//! exactly once, either by [`SubscriptionLease::release`] or, failing that,
//! when the lease is dropped inside a tokio runtime.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use ecoretree_core::{log_op_end, log_op_error, log_op_start, Result, SyncError};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::ports::{ModelServerClient, PushStream};

/// Tracks which documents have an open push channel
#[derive(Clone)]
pub struct SubscriptionManager {
    client: Arc<dyn ModelServerClient>,
    active: Arc<Mutex<HashSet<String>>>,
}

impl SubscriptionManager {
    pub fn new(client: Arc<dyn ModelServerClient>) -> Self {
        Self {
            client,
            active: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn is_subscribed(&self, document_id: &str) -> bool {
        self.active
            .lock()
            .map(|active| active.contains(document_id))
            .unwrap_or(false)
    }

    /// Open the push channel for `document_id`
    ///
    /// Returns `None` when the document is already subscribed.
    ///
    /// # Errors
    ///
    /// Any error from the client; the document stays unsubscribed.
    pub async fn subscribe(&self, document_id: &str) -> Result<Option<SubscriptionLease>> {
        if !self.mark(document_id, true)? {
            debug!(document_id, "already subscribed");
            return Ok(None);
        }

        log_op_start!("subscribe", document_id = document_id);
        let start = Instant::now();
        match self.client.subscribe(document_id).await {
            Ok(stream) => {
                log_op_end!(
                    "subscribe",
                    duration_ms = start.elapsed().as_millis() as u64,
                    document_id = document_id
                );
                Ok(Some(SubscriptionLease {
                    document_id: document_id.to_string(),
                    manager: self.clone(),
                    stream: Some(stream),
                    released: false,
                }))
            }
            Err(e) => {
                self.mark(document_id, false)?;
                log_op_error!(
                    "subscribe",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    document_id = document_id
                );
                Err(e)
            }
        }
    }

    /// Close the push channel for `document_id`
    ///
    /// Returns false when the document was not subscribed.
    ///
    /// # Errors
    ///
    /// Any error from the client. The document is considered unsubscribed
    /// either way.
    pub async fn unsubscribe(&self, document_id: &str) -> Result<bool> {
        if !self.mark(document_id, false)? {
            return Ok(false);
        }

        log_op_start!("unsubscribe", document_id = document_id);
        let start = Instant::now();
        match self.client.unsubscribe(document_id).await {
            Ok(()) => {
                log_op_end!(
                    "unsubscribe",
                    duration_ms = start.elapsed().as_millis() as u64,
                    document_id = document_id
                );
                Ok(true)
            }
            Err(e) => {
                log_op_error!(
                    "unsubscribe",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    document_id = document_id
                );
                Err(e)
            }
        }
    }

    /// Flip the active bit; returns whether it changed
    fn mark(&self, document_id: &str, subscribed: bool) -> Result<bool> {
        let mut active = self.active.lock().map_err(|_| SyncError::Subscription {
            document_id: document_id.to_string(),
            reason: "subscription registry poisoned".to_string(),
        })?;
        Ok(if subscribed {
            active.insert(document_id.to_string())
        } else {
            active.remove(document_id)
        })
    }
}

/// Scoped ownership of one document subscription
pub struct SubscriptionLease {
    document_id: String,
    manager: SubscriptionManager,
    stream: Option<PushStream>,
    released: bool,
}

impl SubscriptionLease {
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Take the push stream; later calls return `None`
    pub fn take_stream(&mut self) -> Option<PushStream> {
        self.stream.take()
    }

    /// Unsubscribe now
    ///
    /// # Errors
    ///
    /// Any error from the client.
    pub async fn release(mut self) -> Result<()> {
        self.released = true;
        self.stream = None;
        self.manager.unsubscribe(&self.document_id).await.map(|_| ())
    }
}

impl Drop for SubscriptionLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.stream = None;

        let manager = self.manager.clone();
        let document_id = std::mem::take(&mut self.document_id);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = manager.unsubscribe(&document_id).await {
                        warn!(document_id = %document_id, error = %e, "unsubscribe on drop failed");
                    }
                });
            }
            Err(_) => {
                warn!(document_id = %document_id, "lease dropped outside a runtime, subscription left open");
            }
        }
    }
}
