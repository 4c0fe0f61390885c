use crate::domain::article::{Article, Category};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum ArticleRepositoryError {
    #[error("database error: {0}")]
    Database(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for ArticleRepositoryError {
    fn from(err: sqlx::Error) -> Self {
        ArticleRepositoryError::Database(err.to_string())
    }
}

impl From<ArticleRepositoryError> for AppError {
    fn from(err: ArticleRepositoryError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Document-store port for article documents.
///
/// The store provides per-document last-write-wins updates; the trigger
/// relies on that plus the conditional writes below for correctness. The
/// terminal writes each set the whole invariant group in one update:
/// `audio_ready` is true only in READY, `tts_error_message` is present
/// only in ERROR.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn find(
        &self,
        category: Category,
        doc_id: &str,
    ) -> Result<Option<Article>, ArticleRepositoryError>;

    /// Claim the in-flight marker: atomically move the document from
    /// PENDING to PROCESSING (clearing `audio_ready`) and return it.
    ///
    /// Returns `None` when the document is missing or no longer PENDING,
    /// meaning another invocation owns this transition and the caller must
    /// not synthesize. This is the lease that closes the double-start race
    /// left open by the guard condition alone.
    async fn claim_processing(
        &self,
        category: Category,
        doc_id: &str,
    ) -> Result<Option<Article>, ArticleRepositoryError>;

    /// Terminal success write: READY, `audio_ready = true`, the storage
    /// path, and `tts_error_message` removed (absence is the error signal).
    async fn mark_ready(
        &self,
        category: Category,
        doc_id: &str,
        storage_path: &str,
    ) -> Result<(), ArticleRepositoryError>;

    /// Terminal failure write: ERROR, `audio_ready = false`, the failure
    /// message. `audio_storage_path` is left untouched.
    async fn mark_error(
        &self,
        category: Category,
        doc_id: &str,
        message: &str,
    ) -> Result<(), ArticleRepositoryError>;

    /// Manual recovery: move an ERROR document back to PENDING, clearing
    /// the error message so a fresh PENDING-entry event fires. Returns
    /// `None` when the document is missing or not in ERROR.
    async fn reset_for_retry(
        &self,
        category: Category,
        doc_id: &str,
    ) -> Result<Option<Article>, ArticleRepositoryError>;

    /// Reaper support: force every document still PROCESSING since before
    /// `cutoff` into terminal ERROR with `message`. Returns the number of
    /// documents swept.
    async fn fail_stuck_processing(
        &self,
        cutoff: DateTime<Utc>,
        message: &str,
    ) -> Result<u64, ArticleRepositoryError>;
}
