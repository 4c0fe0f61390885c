use super::error::TtsTriggerError;
use super::voice::default_voice_for_language;
use crate::domain::article::{Article, Category, TtsStatus};
use crate::infrastructure::events::WriteEvent;
use crate::infrastructure::repositories::{
    ArticleRepository, AudioEncoding, SynthesisRepository, SynthesisRequest,
};
use html2text::from_read;
use std::sync::Arc;
use std::time::Duration;

/// Terminal error message for documents whose resolved text is blank.
pub const EMPTY_INPUT_MESSAGE: &str = "empty input text";

/// Tunables for the trigger state machine.
#[derive(Debug, Clone)]
pub struct TriggerSettings {
    /// Bucket URI the audio objects land under, e.g. `s3://briefcast-audio`.
    pub audio_bucket_uri: String,
    pub default_language_code: String,
    pub default_voice_name: String,
    /// Upper bound on the synthesis await. Must sit comfortably below any
    /// execution ceiling of the hosting environment.
    pub synthesis_timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The write was not a PENDING-entry transition.
    NotPendingEntry,
    /// Another invocation claimed the document first, or it vanished.
    LeaseLost,
}

/// What handling one write event did to the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerOutcome {
    Skipped(SkipReason),
    Ready { storage_path: String },
    Errored { message: String },
}

/// Deterministic object path for a document's audio: repeated attempts
/// overwrite the same object instead of accumulating orphans.
pub fn audio_storage_path(category: Category, doc_id: &str) -> String {
    format!(
        "{}/{}.{}",
        category.as_str(),
        doc_id,
        AudioEncoding::Linear16.file_extension()
    )
}

/// The long-audio TTS trigger: drives one document through
/// PENDING → PROCESSING → READY/ERROR per observed PENDING-entry write.
pub struct TtsTriggerService {
    articles: Arc<dyn ArticleRepository>,
    synthesizer: Arc<dyn SynthesisRepository>,
    settings: TriggerSettings,
}

impl TtsTriggerService {
    pub fn new(
        articles: Arc<dyn ArticleRepository>,
        synthesizer: Arc<dyn SynthesisRepository>,
        settings: TriggerSettings,
    ) -> Self {
        Self {
            articles,
            synthesizer,
            settings,
        }
    }

    /// The PENDING-entry guard: fire only when the write left the document
    /// PENDING and it was not already PENDING before. Debounces duplicate
    /// events for the same logical transition, and makes a manual
    /// ERROR → PENDING reset the retry mechanism.
    pub fn should_fire(before: Option<TtsStatus>, after: Option<TtsStatus>) -> bool {
        after == Some(TtsStatus::Pending) && before != Some(TtsStatus::Pending)
    }

    /// Handle one document-write event.
    ///
    /// Every synthesis failure is absorbed into a terminal ERROR write on
    /// the document; the returned `Err` only signals that a document-store
    /// write itself failed, so the event is always acknowledged and never
    /// redelivered.
    pub async fn handle_event(
        &self,
        event: &WriteEvent,
    ) -> Result<TriggerOutcome, TtsTriggerError> {
        if !Self::should_fire(event.before_status, event.after_status) {
            return Ok(TriggerOutcome::Skipped(SkipReason::NotPendingEntry));
        }

        let category = event.category;
        let doc_id = event.doc_id.as_str();

        // Claim the in-flight marker before anything else. Losing the
        // claim means another invocation owns this transition.
        let Some(article) = self.articles.claim_processing(category, doc_id).await? else {
            tracing::debug!(
                category = %category,
                doc_id = doc_id,
                "document already claimed or gone, skipping"
            );
            return Ok(TriggerOutcome::Skipped(SkipReason::LeaseLost));
        };

        let text = clean_text(article.synthesis_text());
        if text.is_empty() {
            tracing::warn!(
                category = %category,
                doc_id = doc_id,
                "no synthesizable text, failing without a provider call"
            );
            self.articles
                .mark_error(category, doc_id, EMPTY_INPUT_MESSAGE)
                .await?;
            return Ok(TriggerOutcome::Errored {
                message: EMPTY_INPUT_MESSAGE.to_string(),
            });
        }

        let (language_code, voice_name) = resolve_voice(&article, &self.settings);
        let storage_path = audio_storage_path(category, doc_id);
        let output_uri = format!(
            "{}/{}",
            self.settings.audio_bucket_uri.trim_end_matches('/'),
            storage_path
        );

        tracing::info!(
            category = %category,
            doc_id = doc_id,
            language_code = %language_code,
            voice = %voice_name,
            text_length = text.len(),
            output_uri = %output_uri,
            "starting long-audio synthesis"
        );

        let request = SynthesisRequest {
            text,
            language_code,
            voice_name,
            encoding: AudioEncoding::Linear16,
            output_uri,
        };

        let mut operation = match self.synthesizer.start_synthesis(request).await {
            Ok(operation) => operation,
            Err(err) => {
                let message = err.to_string();
                tracing::error!(
                    category = %category,
                    doc_id = doc_id,
                    error = %message,
                    "synthesis submission rejected"
                );
                self.articles.mark_error(category, doc_id, &message).await?;
                return Ok(TriggerOutcome::Errored { message });
            }
        };

        match tokio::time::timeout(self.settings.synthesis_timeout, operation.wait()).await {
            Ok(Ok(outcome)) => {
                tracing::info!(
                    category = %category,
                    doc_id = doc_id,
                    operation_id = operation.operation_id(),
                    audio_size_bytes = outcome.audio_size_bytes,
                    "synthesis completed"
                );
                self.articles
                    .mark_ready(category, doc_id, &storage_path)
                    .await?;
                Ok(TriggerOutcome::Ready { storage_path })
            }
            Ok(Err(err)) => {
                let message = err.to_string();
                tracing::error!(
                    category = %category,
                    doc_id = doc_id,
                    operation_id = operation.operation_id(),
                    error = %message,
                    "synthesis operation failed"
                );
                self.articles.mark_error(category, doc_id, &message).await?;
                Ok(TriggerOutcome::Errored { message })
            }
            Err(_elapsed) => {
                // Force a terminal state instead of leaving the document
                // wedged in PROCESSING past the host's execution ceiling.
                operation.abort();
                let message = format!(
                    "synthesis timed out after {}s",
                    self.settings.synthesis_timeout.as_secs()
                );
                tracing::error!(
                    category = %category,
                    doc_id = doc_id,
                    operation_id = operation.operation_id(),
                    "synthesis timed out, aborting operation"
                );
                self.articles.mark_error(category, doc_id, &message).await?;
                Ok(TriggerOutcome::Errored { message })
            }
        }
    }
}

/// Resolve the voice selection for a document: explicit fields first, then
/// a per-language default voice, then the fixed defaults.
fn resolve_voice(article: &Article, settings: &TriggerSettings) -> (String, String) {
    let language_code = match &article.tts_language_code {
        Some(code) if !code.trim().is_empty() => code.clone(),
        _ => settings.default_language_code.clone(),
    };

    let voice_name = match &article.tts_voice_name {
        Some(name) if !name.trim().is_empty() => name.clone(),
        _ => default_voice_for_language(&language_code)
            .map(str::to_string)
            .unwrap_or_else(|| settings.default_voice_name.clone()),
    };

    (language_code, voice_name)
}

/// Clean text by removing HTML markup, URLs and redundant whitespace
/// before it reaches a synthesis provider.
fn clean_text(text: &str) -> String {
    let plain_text = from_read(text.as_bytes(), usize::MAX);

    let url_pattern = regex::Regex::new(r"https?://[^\s]+").unwrap();
    let without_urls = url_pattern.replace_all(&plain_text, "");

    let whitespace_pattern = regex::Regex::new(r"\s+").unwrap();
    let normalized = whitespace_pattern.replace_all(&without_urls, " ");

    normalized.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn settings() -> TriggerSettings {
        TriggerSettings {
            audio_bucket_uri: "s3://briefcast-audio".to_string(),
            default_language_code: "cmn-CN".to_string(),
            default_voice_name: "Zhiyu".to_string(),
            synthesis_timeout: Duration::from_secs(300),
        }
    }

    fn article(language: Option<&str>, voice: Option<&str>) -> Article {
        Article {
            category: Category::Technology,
            doc_id: "doc1".to_string(),
            content: "body".to_string(),
            voice_text: None,
            tts_language_code: language.map(|s| s.to_string()),
            tts_voice_name: voice.map(|s| s.to_string()),
            tts_status: Some(TtsStatus::Pending),
            audio_ready: false,
            audio_storage_path: None,
            tts_error_message: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_guard_fires_only_on_pending_entry() {
        use TtsStatus::*;

        // (before, after, expected)
        let cases = [
            (None, Some(Pending), true),
            (Some(Error), Some(Pending), true),
            (Some(Ready), Some(Pending), true),
            (Some(Processing), Some(Pending), true),
            (Some(Pending), Some(Pending), false),
            (Some(Pending), Some(Processing), false),
            (None, None, false),
            (None, Some(Processing), false),
            (None, Some(Ready), false),
            (None, Some(Error), false),
            (Some(Error), Some(Error), false),
        ];

        for (before, after, expected) in cases {
            assert_eq!(
                TtsTriggerService::should_fire(before, after),
                expected,
                "before={before:?} after={after:?}"
            );
        }
    }

    #[test]
    fn test_audio_storage_path_is_deterministic() {
        assert_eq!(
            audio_storage_path(Category::Business, "doc123"),
            "business/doc123.wav"
        );
        assert_eq!(
            audio_storage_path(Category::Security, "abc"),
            "security/abc.wav"
        );
    }

    #[test]
    fn test_resolve_voice_defaults_when_both_absent() {
        let (language, voice) = resolve_voice(&article(None, None), &settings());
        assert_eq!(language, "cmn-CN");
        assert_eq!(voice, "Zhiyu");
    }

    #[test]
    fn test_resolve_voice_blank_fields_count_as_absent() {
        let (language, voice) = resolve_voice(&article(Some("  "), Some("")), &settings());
        assert_eq!(language, "cmn-CN");
        assert_eq!(voice, "Zhiyu");
    }

    #[test]
    fn test_resolve_voice_language_only_picks_matching_voice() {
        let (language, voice) = resolve_voice(&article(Some("en-US"), None), &settings());
        assert_eq!(language, "en-US");
        assert_eq!(voice, "Joanna");
    }

    #[test]
    fn test_resolve_voice_unmapped_language_falls_back_to_default_voice() {
        let (language, voice) = resolve_voice(&article(Some("sv-SE"), None), &settings());
        assert_eq!(language, "sv-SE");
        assert_eq!(voice, "Zhiyu");
    }

    #[test]
    fn test_resolve_voice_explicit_fields_win() {
        let (language, voice) =
            resolve_voice(&article(Some("en-US"), Some("Matthew")), &settings());
        assert_eq!(language, "en-US");
        assert_eq!(voice, "Matthew");
    }

    #[test]
    fn test_clean_text_removes_html() {
        let result = clean_text("<p>Hello <strong>world</strong>!</p>");
        assert!(!result.contains('<'));
        assert!(result.contains("Hello"));
        assert!(result.contains("world"));
    }

    #[test]
    fn test_clean_text_removes_urls() {
        let result = clean_text("Check this out https://example.com and http://test.com");
        assert!(!result.contains("https://"));
        assert!(!result.contains("http://"));
        assert!(result.contains("Check this out"));
    }

    #[test]
    fn test_clean_text_normalizes_whitespace() {
        let result = clean_text("Too    many     spaces\n\nand\n\nnewlines");
        assert_eq!(result, "Too many spaces and newlines");
    }

    #[test]
    fn test_clean_text_passes_plain_text_through() {
        assert_eq!(clean_text("市场上涨"), "市场上涨");
    }

    #[test]
    fn test_clean_text_blank_input_is_empty() {
        assert_eq!(clean_text("   \n\t  "), "");
        assert_eq!(clean_text("https://only-a-link.example"), "");
    }
}
