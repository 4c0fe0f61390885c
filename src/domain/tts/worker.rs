use super::service::{TriggerOutcome, TtsTriggerService};
use crate::domain::article::Category;
use crate::infrastructure::events::WriteEventSource;
use crate::infrastructure::repositories::ArticleRepository;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;

/// Terminal message written onto documents the reaper recovers.
pub const STUCK_PROCESSING_MESSAGE: &str =
    "synthesis did not complete before the processing deadline";

/// Consume write events for one category collection and run the trigger.
///
/// One worker exists per category; they share the service and differ only
/// in the collection they are bound to. Each event is handled on its own
/// task so documents never wait on each other's synthesis; the lease claim
/// serializes racing invocations for the same document.
pub async fn run_trigger_worker(
    category: Category,
    source: Arc<dyn WriteEventSource>,
    service: Arc<TtsTriggerService>,
) {
    let mut events = match source.subscribe(category).await {
        Ok(rx) => rx,
        Err(e) => {
            tracing::error!(
                category = %category,
                error = %e,
                "could not subscribe to write events, worker not started"
            );
            return;
        }
    };

    tracing::info!(category = %category, "tts trigger worker started");

    while let Some(event) = events.recv().await {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            match service.handle_event(&event).await {
                Ok(TriggerOutcome::Skipped(reason)) => {
                    tracing::debug!(
                        category = %event.category,
                        doc_id = %event.doc_id,
                        reason = ?reason,
                        "write event skipped"
                    );
                }
                Ok(TriggerOutcome::Ready { storage_path }) => {
                    tracing::info!(
                        category = %event.category,
                        doc_id = %event.doc_id,
                        storage_path = %storage_path,
                        "document audio ready"
                    );
                }
                Ok(TriggerOutcome::Errored { message }) => {
                    tracing::warn!(
                        category = %event.category,
                        doc_id = %event.doc_id,
                        error = %message,
                        "document audio failed"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        category = %event.category,
                        doc_id = %event.doc_id,
                        error = %e,
                        "trigger could not record an outcome"
                    );
                }
            }
        });
    }

    tracing::info!(category = %category, "tts trigger worker stopped");
}

#[derive(Debug, Clone)]
pub struct ReaperSettings {
    pub interval: Duration,
    /// How long a document may sit in PROCESSING before it is considered
    /// abandoned. Must exceed the synthesis timeout.
    pub processing_deadline: Duration,
}

/// Sweep documents stuck in PROCESSING into terminal ERROR.
///
/// The in-handler timeout covers the normal case; this loop covers the
/// process dying between the lease claim and the terminal write, which
/// would otherwise wedge the document forever.
pub async fn run_processing_reaper(
    articles: Arc<dyn ArticleRepository>,
    settings: ReaperSettings,
) {
    let mut ticker = tokio::time::interval(settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let deadline = chrono::Duration::from_std(settings.processing_deadline)
        .unwrap_or_else(|_| chrono::Duration::seconds(600));

    loop {
        ticker.tick().await;
        let cutoff = chrono::Utc::now() - deadline;

        match articles
            .fail_stuck_processing(cutoff, STUCK_PROCESSING_MESSAGE)
            .await
        {
            Ok(0) => {}
            Ok(count) => {
                tracing::warn!(count, "swept documents stuck in PROCESSING");
            }
            Err(e) => {
                tracing::error!(error = %e, "processing reaper sweep failed");
            }
        }
    }
}
