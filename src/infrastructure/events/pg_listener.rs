use super::{EventSourceError, WriteEvent, WriteEventSource};
use crate::domain::article::{Category, TtsStatus};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use serde::Deserialize;
use sqlx::postgres::PgListener;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Channel name prefix; the row trigger appends the category.
pub const CHANNEL_PREFIX: &str = "article_writes_";

/// Wire shape of the NOTIFY payload emitted by the articles row trigger.
#[derive(Debug, Deserialize)]
struct WritePayload {
    category: String,
    doc_id: String,
    before_status: Option<String>,
    after_status: Option<String>,
}

/// Postgres LISTEN/NOTIFY implementation of the write-event source.
///
/// Each subscription holds its own listener connection and pumps parsed
/// events into a bounded channel. `PgListener` reconnects on its own; a
/// dropped receiver ends the pump task.
pub struct PgWriteEventSource {
    pool: Arc<DbPool>,
}

impl PgWriteEventSource {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WriteEventSource for PgWriteEventSource {
    async fn subscribe(
        &self,
        category: Category,
    ) -> Result<mpsc::Receiver<WriteEvent>, EventSourceError> {
        let mut listener = PgListener::connect_with(self.pool.as_ref())
            .await
            .map_err(|e| EventSourceError::Subscribe(e.to_string()))?;

        let channel = format!("{CHANNEL_PREFIX}{category}");
        listener
            .listen(&channel)
            .await
            .map_err(|e| EventSourceError::Subscribe(e.to_string()))?;

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        let Some(event) = parse_payload(notification.payload()) else {
                            continue;
                        };
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        // recv re-establishes the connection internally on
                        // the next call; notifications sent while the
                        // connection was down are lost, which the reaper
                        // eventually compensates for.
                        tracing::error!(
                            channel = %channel,
                            error = %e,
                            "write event listener connection error"
                        );
                    }
                }
            }
            tracing::info!(channel = %channel, "write event pump stopped");
        });

        Ok(rx)
    }
}

fn parse_payload(payload: &str) -> Option<WriteEvent> {
    let parsed: WritePayload = match serde_json::from_str(payload) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, payload = payload, "dropping malformed write event payload");
            return None;
        }
    };

    let Some(category) = Category::parse(&parsed.category) else {
        tracing::warn!(category = %parsed.category, "dropping write event for unknown category");
        return None;
    };

    Some(WriteEvent {
        category,
        doc_id: parsed.doc_id,
        before_status: parsed.before_status.as_deref().and_then(TtsStatus::parse),
        after_status: parsed.after_status.as_deref().and_then(TtsStatus::parse),
    })
}
