use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    domain::article::{Article, Category, TtsStatus},
    error::{AppError, AppResult},
    infrastructure::repositories::ArticleRepository,
};

/// TTS lifecycle fields of one document, as exposed to operators and the
/// polling frontend.
#[derive(Debug, Serialize)]
pub struct TtsStatusResponse {
    pub category: Category,
    pub doc_id: String,
    pub tts_status: Option<TtsStatus>,
    pub audio_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_storage_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_error_message: Option<String>,
}

impl From<Article> for TtsStatusResponse {
    fn from(article: Article) -> Self {
        Self {
            category: article.category,
            doc_id: article.doc_id,
            tts_status: article.tts_status,
            audio_ready: article.audio_ready,
            audio_storage_path: article.audio_storage_path,
            tts_error_message: article.tts_error_message,
        }
    }
}

pub struct TtsController {
    articles: Arc<dyn ArticleRepository>,
}

impl TtsController {
    pub fn new(articles: Arc<dyn ArticleRepository>) -> Self {
        Self { articles }
    }

    fn parse_category(raw: &str) -> AppResult<Category> {
        Category::parse(raw)
            .ok_or_else(|| AppError::BadRequest(format!("unknown category: {raw}")))
    }

    /// GET /api/articles/:category/:doc_id/tts - read the TTS lifecycle fields
    pub async fn get_status(
        State(controller): State<Arc<TtsController>>,
        Path((category, doc_id)): Path<(String, String)>,
    ) -> AppResult<Json<TtsStatusResponse>> {
        let category = Self::parse_category(&category)?;

        let article = controller
            .articles
            .find(category, &doc_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("article {category}/{doc_id}")))?;

        Ok(Json(TtsStatusResponse::from(article)))
    }

    /// POST /api/articles/:category/:doc_id/tts/retry - reset an ERROR
    /// document back to PENDING so the trigger runs a fresh attempt
    pub async fn retry(
        State(controller): State<Arc<TtsController>>,
        Path((category, doc_id)): Path<(String, String)>,
    ) -> AppResult<(StatusCode, Json<TtsStatusResponse>)> {
        let category = Self::parse_category(&category)?;

        if let Some(article) = controller.articles.reset_for_retry(category, &doc_id).await? {
            tracing::info!(
                category = %category,
                doc_id = %doc_id,
                "document reset for a new synthesis attempt"
            );
            return Ok((StatusCode::ACCEPTED, Json(TtsStatusResponse::from(article))));
        }

        // Distinguish "no such document" from "not in a retryable state".
        match controller.articles.find(category, &doc_id).await? {
            None => Err(AppError::NotFound(format!("article {category}/{doc_id}"))),
            Some(article) => Err(AppError::Conflict(format!(
                "tts status is {}, only ERROR documents can be retried",
                article
                    .tts_status
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unset".to_string())
            ))),
        }
    }
}
