#![allow(dead_code)]

use async_trait::async_trait;
use briefcast_backend::domain::article::{Article, Category, TtsStatus};
use briefcast_backend::domain::tts::{TriggerSettings, TtsTriggerService};
use briefcast_backend::infrastructure::events::{EventSourceError, WriteEvent, WriteEventSource};
use briefcast_backend::infrastructure::repositories::{
    ArticleRepository, ArticleRepositoryError, SynthesisError, SynthesisOperation,
    SynthesisOutcome, SynthesisRepository, SynthesisRequest,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// In-memory document store with the same conditional-write semantics as
/// the Postgres implementation: the PROCESSING claim and the retry reset
/// only succeed from the expected prior status.
#[derive(Default)]
pub struct MemoryArticleRepository {
    docs: Mutex<HashMap<(Category, String), Article>>,
}

impl MemoryArticleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, article: Article) {
        self.docs
            .lock()
            .unwrap()
            .insert((article.category, article.doc_id.clone()), article);
    }

    pub fn get(&self, category: Category, doc_id: &str) -> Option<Article> {
        self.docs
            .lock()
            .unwrap()
            .get(&(category, doc_id.to_string()))
            .cloned()
    }
}

#[async_trait]
impl ArticleRepository for MemoryArticleRepository {
    async fn find(
        &self,
        category: Category,
        doc_id: &str,
    ) -> Result<Option<Article>, ArticleRepositoryError> {
        Ok(self.get(category, doc_id))
    }

    async fn claim_processing(
        &self,
        category: Category,
        doc_id: &str,
    ) -> Result<Option<Article>, ArticleRepositoryError> {
        let mut docs = self.docs.lock().unwrap();
        let Some(article) = docs.get_mut(&(category, doc_id.to_string())) else {
            return Ok(None);
        };
        if article.tts_status != Some(TtsStatus::Pending) {
            return Ok(None);
        }
        article.tts_status = Some(TtsStatus::Processing);
        article.audio_ready = false;
        article.updated_at = Utc::now();
        Ok(Some(article.clone()))
    }

    async fn mark_ready(
        &self,
        category: Category,
        doc_id: &str,
        storage_path: &str,
    ) -> Result<(), ArticleRepositoryError> {
        let mut docs = self.docs.lock().unwrap();
        if let Some(article) = docs.get_mut(&(category, doc_id.to_string())) {
            article.tts_status = Some(TtsStatus::Ready);
            article.audio_ready = true;
            article.audio_storage_path = Some(storage_path.to_string());
            article.tts_error_message = None;
            article.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_error(
        &self,
        category: Category,
        doc_id: &str,
        message: &str,
    ) -> Result<(), ArticleRepositoryError> {
        let mut docs = self.docs.lock().unwrap();
        if let Some(article) = docs.get_mut(&(category, doc_id.to_string())) {
            article.tts_status = Some(TtsStatus::Error);
            article.audio_ready = false;
            article.tts_error_message = Some(message.to_string());
            article.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn reset_for_retry(
        &self,
        category: Category,
        doc_id: &str,
    ) -> Result<Option<Article>, ArticleRepositoryError> {
        let mut docs = self.docs.lock().unwrap();
        let Some(article) = docs.get_mut(&(category, doc_id.to_string())) else {
            return Ok(None);
        };
        if article.tts_status != Some(TtsStatus::Error) {
            return Ok(None);
        }
        article.tts_status = Some(TtsStatus::Pending);
        article.audio_ready = false;
        article.tts_error_message = None;
        article.updated_at = Utc::now();
        Ok(Some(article.clone()))
    }

    async fn fail_stuck_processing(
        &self,
        cutoff: DateTime<Utc>,
        message: &str,
    ) -> Result<u64, ArticleRepositoryError> {
        let mut docs = self.docs.lock().unwrap();
        let mut swept = 0;
        for article in docs.values_mut() {
            if article.tts_status == Some(TtsStatus::Processing) && article.updated_at < cutoff {
                article.tts_status = Some(TtsStatus::Error);
                article.audio_ready = false;
                article.tts_error_message = Some(message.to_string());
                article.updated_at = Utc::now();
                swept += 1;
            }
        }
        Ok(swept)
    }
}

#[derive(Clone)]
pub enum MockBehavior {
    Succeed,
    Fail(String),
    Hang,
}

/// Scripted synthesis provider: records every request, then succeeds,
/// fails, or hangs forever depending on its behavior.
pub struct MockSynthesisRepository {
    behavior: MockBehavior,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl MockSynthesisRepository {
    pub fn with_behavior(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_behavior(MockBehavior::Succeed)
    }

    pub fn failing(message: &str) -> Self {
        Self::with_behavior(MockBehavior::Fail(message.to_string()))
    }

    pub fn hanging() -> Self {
        Self::with_behavior(MockBehavior::Hang)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<SynthesisRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SynthesisRepository for MockSynthesisRepository {
    async fn start_synthesis(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesisOperation, SynthesisError> {
        self.requests.lock().unwrap().push(request.clone());
        let behavior = self.behavior.clone();
        Ok(SynthesisOperation::spawn(
            "mock-operation".to_string(),
            async move {
                match behavior {
                    MockBehavior::Succeed => Ok(SynthesisOutcome {
                        output_uri: request.output_uri,
                        audio_size_bytes: 44,
                    }),
                    MockBehavior::Fail(message) => Err(SynthesisError::Provider(message)),
                    MockBehavior::Hang => std::future::pending().await,
                }
            },
        ))
    }
}

/// Event source backed by pre-registered channels, standing in for the
/// Postgres listener.
pub struct ChannelEventSource {
    receivers: Mutex<HashMap<Category, mpsc::Receiver<WriteEvent>>>,
}

impl ChannelEventSource {
    pub fn new(categories: &[Category]) -> (Self, HashMap<Category, mpsc::Sender<WriteEvent>>) {
        let mut receivers = HashMap::new();
        let mut senders = HashMap::new();
        for &category in categories {
            let (tx, rx) = mpsc::channel(16);
            receivers.insert(category, rx);
            senders.insert(category, tx);
        }
        (
            Self {
                receivers: Mutex::new(receivers),
            },
            senders,
        )
    }
}

#[async_trait]
impl WriteEventSource for ChannelEventSource {
    async fn subscribe(
        &self,
        category: Category,
    ) -> Result<mpsc::Receiver<WriteEvent>, EventSourceError> {
        self.receivers
            .lock()
            .unwrap()
            .remove(&category)
            .ok_or_else(|| EventSourceError::Subscribe(format!("no channel for {category}")))
    }
}

pub fn pending_article(category: Category, doc_id: &str, content: &str) -> Article {
    Article {
        category,
        doc_id: doc_id.to_string(),
        content: content.to_string(),
        voice_text: None,
        tts_language_code: None,
        tts_voice_name: None,
        tts_status: Some(TtsStatus::Pending),
        audio_ready: false,
        audio_storage_path: None,
        tts_error_message: None,
        updated_at: Utc::now(),
    }
}

pub fn processing_article(
    category: Category,
    doc_id: &str,
    updated_at: DateTime<Utc>,
) -> Article {
    Article {
        tts_status: Some(TtsStatus::Processing),
        updated_at,
        ..pending_article(category, doc_id, "in flight")
    }
}

pub fn write_event(
    category: Category,
    doc_id: &str,
    before_status: Option<TtsStatus>,
    after_status: Option<TtsStatus>,
) -> WriteEvent {
    WriteEvent {
        category,
        doc_id: doc_id.to_string(),
        before_status,
        after_status,
    }
}

/// A PENDING-entry write for a document that did not previously exist.
pub fn pending_entry(category: Category, doc_id: &str) -> WriteEvent {
    write_event(category, doc_id, None, Some(TtsStatus::Pending))
}

pub fn trigger_settings(synthesis_timeout: Duration) -> TriggerSettings {
    TriggerSettings {
        audio_bucket_uri: "s3://test-audio".to_string(),
        default_language_code: "cmn-CN".to_string(),
        default_voice_name: "Zhiyu".to_string(),
        synthesis_timeout,
    }
}

pub fn service(
    articles: Arc<MemoryArticleRepository>,
    synthesizer: Arc<MockSynthesisRepository>,
) -> TtsTriggerService {
    service_with_timeout(articles, synthesizer, Duration::from_secs(5))
}

pub fn service_with_timeout(
    articles: Arc<MemoryArticleRepository>,
    synthesizer: Arc<MockSynthesisRepository>,
    synthesis_timeout: Duration,
) -> TtsTriggerService {
    TtsTriggerService::new(articles, synthesizer, trigger_settings(synthesis_timeout))
}

/// Poll the store until the document reaches `status` or give up.
pub async fn wait_for_status(
    articles: &MemoryArticleRepository,
    category: Category,
    doc_id: &str,
    status: TtsStatus,
) -> Article {
    for _ in 0..200 {
        if let Some(article) = articles.get(category, doc_id) {
            if article.tts_status == Some(status) {
                return article;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("document {category}/{doc_id} never reached {status}");
}
