//! ecoretree Engine - async synchronization layer
//!
//! Wires the core mirror to its collaborators: a model server reached through
//! [`ports::ModelServerClient`], an editor host notified through
//! [`ports::EditorHost`], and a push channel held by a subscription lease.
//! [`coordinator::SyncCoordinator`] owns the mirror and is the only place it
//! is mutated; [`session::EditorSession`] runs it as a task.

pub mod config;
pub mod coordinator;
pub mod memory;
pub mod ports;
pub mod session;
pub mod subscription;

pub use config::SyncConfig;
pub use coordinator::SyncCoordinator;
pub use ports::{EditorHost, ModelServerClient, PushStream};
pub use session::{EditorSession, SessionEvent};
pub use subscription::{SubscriptionLease, SubscriptionManager};
