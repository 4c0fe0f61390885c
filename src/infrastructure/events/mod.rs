pub mod pg_listener;

pub use pg_listener::PgWriteEventSource;

use crate::domain::article::{Category, TtsStatus};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// One document write, projected down to what the trigger guard reads.
///
/// The full before/after snapshots never travel with the event: the guard
/// only inspects the two status fields, and the handler re-reads the
/// document through the lease claim, so stale snapshot contents can never
/// feed a synthesis. `None` covers both "document absent" and "status
/// field unset or unrecognized".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteEvent {
    pub category: Category,
    pub doc_id: String,
    pub before_status: Option<TtsStatus>,
    pub after_status: Option<TtsStatus>,
}

#[derive(Debug, thiserror::Error)]
pub enum EventSourceError {
    #[error("event subscription failed: {0}")]
    Subscribe(String),
}

/// Inbound port delivering document-write events for one category
/// collection. A trigger worker subscribes once at startup, mirroring the
/// per-collection registration of the hosting event system.
#[async_trait]
pub trait WriteEventSource: Send + Sync {
    async fn subscribe(
        &self,
        category: Category,
    ) -> Result<mpsc::Receiver<WriteEvent>, EventSourceError>;
}
