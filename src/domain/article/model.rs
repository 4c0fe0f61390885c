use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The fixed category collections articles are partitioned into.
/// Every trigger worker is bound to exactly one of these at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Business,
    Technology,
    Sports,
    Security,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Business,
        Category::Technology,
        Category::Sports,
        Category::Security,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Technology => "technology",
            Category::Sports => "sports",
            Category::Security => "security",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "business" => Some(Category::Business),
            "technology" => Some(Category::Technology),
            "sports" => Some(Category::Sports),
            "security" => Some(Category::Security),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle states of a per-document speech-synthesis attempt.
///
/// A document whose status field is absent or holds any other string is
/// untracked: the trigger never fires for it, which is why the field is
/// modeled as `Option<TtsStatus>` everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TtsStatus {
    Pending,
    Processing,
    Ready,
    Error,
}

impl TtsStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsStatus::Pending => "PENDING",
            TtsStatus::Processing => "PROCESSING",
            TtsStatus::Ready => "READY",
            TtsStatus::Error => "ERROR",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(TtsStatus::Pending),
            "PROCESSING" => Some(TtsStatus::Processing),
            "READY" => Some(TtsStatus::Ready),
            "ERROR" => Some(TtsStatus::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for TtsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An article document in one of the category collections.
///
/// Ingestion (out of scope) writes `content` and the optional `voice_text`
/// override and sets `tts_status` to PENDING. The TTS trigger is the only
/// writer of the remaining audio fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub category: Category,
    pub doc_id: String,
    pub content: String,
    pub voice_text: Option<String>,
    pub tts_language_code: Option<String>,
    pub tts_voice_name: Option<String>,
    pub tts_status: Option<TtsStatus>,
    pub audio_ready: bool,
    pub audio_storage_path: Option<String>,
    pub tts_error_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// The text to synthesize: `voice_text` when it carries something
    /// beyond whitespace, otherwise the full `content`.
    pub fn synthesis_text(&self) -> &str {
        match &self.voice_text {
            Some(v) if !v.trim().is_empty() => v,
            _ => &self.content,
        }
    }
}
