//! Synchronization coordinator
//!
//! Owns one editor's [`Mirror`] and moves changes both ways:
//!
//! - local form edits are diffed against the last acknowledged payload of the
//!   node and sent as a single `Set` for the first changed field;
//! - push messages are handed to the mirror, and the host is told what to
//!   redraw or refresh.
//!
//! A local edit and a remote patch of the same node can cross on the wire.
//! Nothing orders them: the last message applied wins. A remote patch drops
//! the cached baseline of every node it touched, so the next form edit of
//! such a node is diffed against the patched data.
//!
//! Inside [`SyncCoordinator::run`] edits are sent in the background and a
//! refetch is polled alongside the queues, so neither holds up the other side.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use ecoretree_core::codec::build_set_command;
use ecoretree_core::core_types::{SessionId, SyncContext};
use ecoretree_core::mirror::{LoadOutcome, PushMessage, PushOutcome};
use ecoretree_core::{
    diff, log_op_end, log_op_error, log_op_start, Command, LabelResolver, Mirror, ModelService,
    NodeId, Payload, Result, SyncError,
};
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::ports::{EditorHost, ModelServerClient, PushStream};
use crate::session::SessionEvent;
use crate::subscription::{SubscriptionLease, SubscriptionManager};

/// Snapshot fetch in flight
type PendingFetch = BoxFuture<'static, Fetched>;

struct Fetched {
    ctx: SyncContext,
    duration_ms: u64,
    result: Result<Value>,
}

pub struct SyncCoordinator {
    context: SyncContext,
    document_id: String,
    owner_base: String,
    client: Arc<dyn ModelServerClient>,
    host: Arc<dyn EditorHost>,
    subscriptions: SubscriptionManager,
    mirror: Mirror,
    model_service: ModelService,
    /// Last payload sent (or loaded) per node
    baselines: HashMap<NodeId, Payload>,
    lease: Option<SubscriptionLease>,
    pushes: Option<PushStream>,
}

impl SyncCoordinator {
    pub fn new(
        config: &SyncConfig,
        client: Arc<dyn ModelServerClient>,
        host: Arc<dyn EditorHost>,
        labels: Arc<dyn LabelResolver>,
    ) -> Self {
        Self {
            context: SyncContext::new(SessionId::new(), config.document_id.clone()),
            document_id: config.document_id.clone(),
            owner_base: config.owner_base(),
            subscriptions: SubscriptionManager::new(client.clone()),
            client,
            host,
            mirror: Mirror::new(config.document_id.clone(), labels),
            model_service: ModelService::new(),
            baselines: HashMap::new(),
            lease: None,
            pushes: None,
        }
    }

    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    pub fn model_service(&self) -> &ModelService {
        &self.model_service
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.context.session_id
    }

    pub fn is_subscribed(&self) -> bool {
        self.lease.is_some()
    }

    /// Load the document and open its push channel
    ///
    /// A failed fetch leaves the mirror in its error state and is shown by the
    /// host; the channel is opened anyway so a later full update can recover.
    ///
    /// # Errors
    ///
    /// Only subscription failures.
    pub async fn open(&mut self) -> Result<()> {
        self.load(&[]).await;

        if let Some(mut lease) = self.subscriptions.subscribe(&self.document_id).await? {
            self.pushes = lease.take_stream();
            self.lease = Some(lease);
        }
        Ok(())
    }

    /// Fetch the document and rebuild, restoring the selection at `path`
    pub async fn load(&mut self, path: &[String]) -> Option<LoadOutcome> {
        let fetched = self.fetch().await;
        self.finish_load(fetched, path)
    }

    fn fetch(&self) -> PendingFetch {
        let ctx = self.context.next_request();
        log_op_start!(
            "load",
            document_id = %self.document_id,
            session_id = %ctx.session_id,
            request_id = %ctx.request_id
        );
        let client = self.client.clone();
        let document_id = self.document_id.clone();
        async move {
            let start = Instant::now();
            let result = client.fetch_snapshot(&document_id).await;
            Fetched {
                ctx,
                duration_ms: start.elapsed().as_millis() as u64,
                result,
            }
        }
        .boxed()
    }

    fn finish_load(&mut self, fetched: Fetched, path: &[String]) -> Option<LoadOutcome> {
        let Fetched {
            ctx,
            duration_ms,
            result,
        } = fetched;
        let result = result.and_then(|snapshot| self.mirror.refresh(snapshot, path));

        match result {
            Ok(outcome) => {
                if let LoadOutcome::Loaded { .. } = outcome {
                    self.baselines.clear();
                    if self.mirror.is_visible() {
                        self.redraw();
                    }
                }
                log_op_end!("load", duration_ms = duration_ms, request_id = %ctx.request_id);
                Some(outcome)
            }
            Err(e) => {
                let text = match &e {
                    SyncError::Transport { status, message } => format!(
                        "An error occurred when requesting '{}' - Status {} {}",
                        self.document_id, status, message
                    ),
                    other => format!(
                        "An error occurred when requesting '{}' - {}",
                        self.document_id, other
                    ),
                };
                log_op_error!("load", e, duration_ms = duration_ms, request_id = %ctx.request_id);
                self.baselines.clear();
                self.mirror.fail(text.clone());
                self.host.render_error(&text);
                None
            }
        }
    }

    /// Propagate a form edit of `node_id`
    ///
    /// Returns the command that was sent, if any. The baseline moves to
    /// `new_payload` whether or not the send succeeds; send failures are only
    /// logged.
    ///
    /// # Errors
    ///
    /// `NodeNotFound` when the node is not in the mirror.
    pub async fn handle_form_update(
        &mut self,
        new_payload: Payload,
        node_id: NodeId,
    ) -> Result<Option<Command>> {
        let command = self.prepare_edit(new_payload, node_id)?;
        if let Some(command) = &command {
            self.send_edit(command.clone()).await;
        }
        Ok(command)
    }

    /// Diff a form payload against the node's baseline and move the baseline
    fn prepare_edit(&mut self, new_payload: Payload, node_id: NodeId) -> Result<Option<Command>> {
        let node = self
            .mirror
            .node(&node_id)
            .ok_or_else(|| SyncError::NodeNotFound {
                node_id: node_id.to_string(),
            })?;
        let baseline = match self.baselines.get(&node_id) {
            Some(baseline) => baseline.clone(),
            None => self.model_service.get_data_for_node(node),
        };

        let changes = diff(&new_payload, &baseline);
        let command = build_set_command(&self.owner_base, &new_payload, &changes);
        if changes.len() > 1 {
            debug!(
                node_id = %node_id,
                changed = changes.len(),
                "only the first changed field is sent"
            );
        }
        self.baselines.insert(node_id, new_payload);
        Ok(command)
    }

    /// Send one edit; the returned future owns everything it needs
    fn send_edit(&self, command: Command) -> BoxFuture<'static, ()> {
        let ctx = self.context.next_request();
        log_op_start!(
            "send_edit",
            document_id = %self.document_id,
            session_id = %ctx.session_id,
            request_id = %ctx.request_id,
            feature = ?command.feature()
        );
        let client = self.client.clone();
        let document_id = self.document_id.clone();
        async move {
            let start = Instant::now();
            match client.send_edit(&document_id, &command).await {
                Ok(()) => log_op_end!(
                    "send_edit",
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = %ctx.request_id
                ),
                Err(e) => log_op_error!(
                    "send_edit",
                    e,
                    duration_ms = start.elapsed().as_millis() as u64,
                    request_id = %ctx.request_id
                ),
            }
        }
        .boxed()
    }

    /// Apply one push message and notify the host
    ///
    /// A message that requires a resync is followed by a refetch before this
    /// returns.
    pub async fn handle_push(&mut self, message: PushMessage) -> PushOutcome {
        let outcome = self.apply_push(message);
        if outcome == PushOutcome::ResyncRequired {
            let path = self.mirror.selected_path();
            self.load(&path).await;
        }
        outcome
    }

    fn apply_push(&mut self, message: PushMessage) -> PushOutcome {
        let outcome = self.mirror.handle_push(message);
        match &outcome {
            PushOutcome::Rebuilt { redraw, .. } => {
                self.baselines.clear();
                if *redraw {
                    self.redraw();
                }
            }
            PushOutcome::Patched {
                refresh_detail,
                touched,
            } => {
                let mirror = &self.mirror;
                self.baselines
                    .retain(|id, _| !touched.contains(id) && mirror.node(id).is_some());
                if *refresh_detail {
                    if let Some(node) = self.mirror.selected_node() {
                        self.host.refresh_detail(node);
                    }
                }
                if self.mirror.is_visible() {
                    self.redraw();
                }
            }
            PushOutcome::ResyncRequired => {
                info!(document_id = %self.document_id, "refetching document");
            }
            PushOutcome::DirtyChanged(dirty) => self.host.dirty_changed(*dirty),
            PushOutcome::Dropped(_) => {}
        }
        outcome
    }

    pub fn select(&mut self, node_id: &NodeId) -> bool {
        self.mirror.select(node_id)
    }

    /// Editor became visible; redraws when a refresh was deferred
    pub fn show(&mut self) {
        if self.mirror.show() {
            self.redraw();
        }
    }

    pub fn hide(&mut self) {
        self.mirror.hide();
    }

    /// Release the push channel
    pub async fn dispose(&mut self) {
        self.pushes = None;
        if let Some(lease) = self.lease.take() {
            if let Err(e) = lease.release().await {
                warn!(document_id = %self.document_id, error = %e, "unsubscribe failed");
            }
        }
    }

    /// Process push messages and local events until disposed
    ///
    /// Each queue is handled in arrival order. Edits are sent on spawned
    /// tasks and a refetch runs alongside both queues; the selection is
    /// restored from whatever is selected when the snapshot arrives. The loop
    /// ends on [`SessionEvent::Dispose`] or when the event sender is dropped,
    /// and always releases the subscription.
    pub async fn run(&mut self, mut events: mpsc::Receiver<SessionEvent>) {
        let mut pushes = self
            .pushes
            .take()
            .unwrap_or_else(|| stream::empty().boxed());
        let mut pushes_open = true;
        let mut refetch: Option<PendingFetch> = None;

        loop {
            tokio::select! {
                fetched = async {
                    match refetch.as_mut() {
                        Some(fetch) => fetch.await,
                        None => std::future::pending().await,
                    }
                }, if refetch.is_some() => {
                    refetch = None;
                    let path = self.mirror.selected_path();
                    self.finish_load(fetched, &path);
                }
                push = pushes.next(), if pushes_open => match push {
                    Some(message) => {
                        let outcome = self.apply_push(message);
                        if outcome == PushOutcome::ResyncRequired && refetch.is_none() {
                            refetch = Some(self.fetch());
                        }
                    }
                    None => {
                        debug!(document_id = %self.document_id, "push channel closed");
                        pushes_open = false;
                    }
                },
                event = events.recv() => match event {
                    Some(SessionEvent::Dispose) | None => break,
                    Some(event) => self.handle_event(event).await,
                },
            }
        }
        self.dispose().await;
    }

    async fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::FormUpdate { node_id, payload } => {
                match self.prepare_edit(payload, node_id) {
                    Ok(Some(command)) => {
                        tokio::spawn(self.send_edit(command));
                    }
                    Ok(None) => {}
                    Err(e) => warn!(node_id = %node_id, error = %e, "form update ignored"),
                }
            }
            SessionEvent::Select(node_id) => {
                self.select(&node_id);
            }
            SessionEvent::Show => self.show(),
            SessionEvent::Hide => self.hide(),
            SessionEvent::Dispose => self.dispose().await,
        }
    }

    fn redraw(&self) {
        if let Some(root) = self.mirror.root() {
            self.host.redraw(root);
        }
    }
}
