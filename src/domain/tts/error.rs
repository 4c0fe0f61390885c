use crate::infrastructure::repositories::ArticleRepositoryError;

/// Errors the trigger cannot absorb into document state: failures of the
/// document-store writes themselves. Synthesis failures never appear here;
/// they become terminal ERROR writes on the document.
#[derive(Debug, thiserror::Error)]
pub enum TtsTriggerError {
    #[error("document store error: {0}")]
    Store(#[from] ArticleRepositoryError),
}
