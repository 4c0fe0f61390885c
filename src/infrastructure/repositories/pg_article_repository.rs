use super::article_repository::{ArticleRepository, ArticleRepositoryError};
use crate::domain::article::{Article, Category, TtsStatus};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Postgres-backed article store.
///
/// Every mutation refreshes `updated_at`, which the reaper uses to spot
/// abandoned PROCESSING documents, and every write fires the row trigger
/// that NOTIFYs the per-category event channel.
pub struct PgArticleRepository {
    pool: Arc<DbPool>,
}

#[derive(Debug, sqlx::FromRow)]
struct ArticleRow {
    category: String,
    doc_id: String,
    content: String,
    voice_text: Option<String>,
    tts_language_code: Option<String>,
    tts_voice_name: Option<String>,
    tts_status: Option<String>,
    audio_ready: bool,
    audio_storage_path: Option<String>,
    tts_error_message: Option<String>,
    updated_at: DateTime<Utc>,
}

impl ArticleRow {
    fn into_article(self) -> Result<Article, ArticleRepositoryError> {
        let category = Category::parse(&self.category).ok_or_else(|| {
            ArticleRepositoryError::Corrupt(format!("unknown category: {}", self.category))
        })?;

        Ok(Article {
            category,
            doc_id: self.doc_id,
            content: self.content,
            voice_text: self.voice_text,
            tts_language_code: self.tts_language_code,
            tts_voice_name: self.tts_voice_name,
            tts_status: self.tts_status.as_deref().and_then(TtsStatus::parse),
            audio_ready: self.audio_ready,
            audio_storage_path: self.audio_storage_path,
            tts_error_message: self.tts_error_message,
            updated_at: self.updated_at,
        })
    }
}

impl PgArticleRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleRepository for PgArticleRepository {
    async fn find(
        &self,
        category: Category,
        doc_id: &str,
    ) -> Result<Option<Article>, ArticleRepositoryError> {
        let row = sqlx::query_as::<_, ArticleRow>(
            "SELECT * FROM articles WHERE category = $1 AND doc_id = $2",
        )
        .bind(category.as_str())
        .bind(doc_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(ArticleRow::into_article).transpose()
    }

    async fn claim_processing(
        &self,
        category: Category,
        doc_id: &str,
    ) -> Result<Option<Article>, ArticleRepositoryError> {
        // Conditional lease: only one of any number of racing invocations
        // gets a row back from this update.
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            UPDATE articles
            SET tts_status = 'PROCESSING', audio_ready = FALSE, updated_at = NOW()
            WHERE category = $1 AND doc_id = $2 AND tts_status = 'PENDING'
            RETURNING *
            "#,
        )
        .bind(category.as_str())
        .bind(doc_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(ArticleRow::into_article).transpose()
    }

    async fn mark_ready(
        &self,
        category: Category,
        doc_id: &str,
        storage_path: &str,
    ) -> Result<(), ArticleRepositoryError> {
        sqlx::query(
            r#"
            UPDATE articles
            SET tts_status = 'READY',
                audio_ready = TRUE,
                audio_storage_path = $3,
                tts_error_message = NULL,
                updated_at = NOW()
            WHERE category = $1 AND doc_id = $2
            "#,
        )
        .bind(category.as_str())
        .bind(doc_id)
        .bind(storage_path)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn mark_error(
        &self,
        category: Category,
        doc_id: &str,
        message: &str,
    ) -> Result<(), ArticleRepositoryError> {
        sqlx::query(
            r#"
            UPDATE articles
            SET tts_status = 'ERROR',
                audio_ready = FALSE,
                tts_error_message = $3,
                updated_at = NOW()
            WHERE category = $1 AND doc_id = $2
            "#,
        )
        .bind(category.as_str())
        .bind(doc_id)
        .bind(message)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn reset_for_retry(
        &self,
        category: Category,
        doc_id: &str,
    ) -> Result<Option<Article>, ArticleRepositoryError> {
        let row = sqlx::query_as::<_, ArticleRow>(
            r#"
            UPDATE articles
            SET tts_status = 'PENDING',
                audio_ready = FALSE,
                tts_error_message = NULL,
                updated_at = NOW()
            WHERE category = $1 AND doc_id = $2 AND tts_status = 'ERROR'
            RETURNING *
            "#,
        )
        .bind(category.as_str())
        .bind(doc_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(ArticleRow::into_article).transpose()
    }

    async fn fail_stuck_processing(
        &self,
        cutoff: DateTime<Utc>,
        message: &str,
    ) -> Result<u64, ArticleRepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE articles
            SET tts_status = 'ERROR',
                audio_ready = FALSE,
                tts_error_message = $2,
                updated_at = NOW()
            WHERE tts_status = 'PROCESSING' AND updated_at < $1
            "#,
        )
        .bind(cutoff)
        .bind(message)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }
}
