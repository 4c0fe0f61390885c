mod helpers;

use briefcast_backend::domain::article::{Category, TtsStatus};
use briefcast_backend::domain::tts::{
    run_processing_reaper, run_trigger_worker, ReaperSettings, STUCK_PROCESSING_MESSAGE,
};
use briefcast_backend::infrastructure::repositories::ArticleRepository;
use chrono::Utc;
use helpers::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_worker_drives_documents_through_the_lifecycle() {
    let articles = Arc::new(MemoryArticleRepository::new());
    let synthesizer = Arc::new(MockSynthesisRepository::succeeding());
    articles.insert(pending_article(Category::Business, "a1", "first"));
    articles.insert(pending_article(Category::Business, "a2", "second"));

    let (source, senders) = ChannelEventSource::new(&[Category::Business]);
    let source = Arc::new(source);
    let svc = Arc::new(service(articles.clone(), synthesizer.clone()));

    let worker = tokio::spawn(run_trigger_worker(Category::Business, source, svc));

    let tx = &senders[&Category::Business];
    tx.send(pending_entry(Category::Business, "a1")).await.unwrap();
    tx.send(pending_entry(Category::Business, "a2")).await.unwrap();

    let a1 = wait_for_status(&articles, Category::Business, "a1", TtsStatus::Ready).await;
    let a2 = wait_for_status(&articles, Category::Business, "a2", TtsStatus::Ready).await;
    assert_eq!(a1.audio_storage_path.as_deref(), Some("business/a1.wav"));
    assert_eq!(a2.audio_storage_path.as_deref(), Some("business/a2.wav"));
    assert_eq!(synthesizer.request_count(), 2);

    // Closing the event feed stops the worker.
    drop(senders);
    tokio::time::timeout(Duration::from_secs(1), worker)
        .await
        .expect("worker should stop when the event feed closes")
        .unwrap();
}

#[tokio::test]
async fn test_worker_skips_non_firing_events() {
    let articles = Arc::new(MemoryArticleRepository::new());
    let synthesizer = Arc::new(MockSynthesisRepository::succeeding());
    articles.insert(pending_article(Category::Sports, "s1", "text"));

    let (source, senders) = ChannelEventSource::new(&[Category::Sports]);
    let source = Arc::new(source);
    let svc = Arc::new(service(articles.clone(), synthesizer.clone()));

    let worker = tokio::spawn(run_trigger_worker(Category::Sports, source, svc));

    // A lifecycle write from a previous invocation: not a PENDING entry.
    let tx = &senders[&Category::Sports];
    tx.send(write_event(
        Category::Sports,
        "s1",
        Some(TtsStatus::Processing),
        Some(TtsStatus::Ready),
    ))
    .await
    .unwrap();

    drop(senders);
    tokio::time::timeout(Duration::from_secs(1), worker)
        .await
        .unwrap()
        .unwrap();

    // The worker hands events to their own tasks; let the last one settle.
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(synthesizer.request_count(), 0);
    let article = articles.get(Category::Sports, "s1").unwrap();
    assert_eq!(article.tts_status, Some(TtsStatus::Pending));
}

#[tokio::test]
async fn test_stuck_processing_sweep_recovers_abandoned_documents() {
    let articles = Arc::new(MemoryArticleRepository::new());

    // Abandoned an hour ago vs. freshly claimed.
    articles.insert(processing_article(
        Category::Business,
        "stale",
        Utc::now() - chrono::Duration::hours(1),
    ));
    articles.insert(processing_article(Category::Business, "fresh", Utc::now()));

    let cutoff = Utc::now() - chrono::Duration::minutes(10);
    let swept = articles
        .fail_stuck_processing(cutoff, STUCK_PROCESSING_MESSAGE)
        .await
        .unwrap();
    assert_eq!(swept, 1);

    let stale = articles.get(Category::Business, "stale").unwrap();
    assert_eq!(stale.tts_status, Some(TtsStatus::Error));
    assert!(!stale.audio_ready);
    assert_eq!(
        stale.tts_error_message.as_deref(),
        Some(STUCK_PROCESSING_MESSAGE)
    );

    let fresh = articles.get(Category::Business, "fresh").unwrap();
    assert_eq!(fresh.tts_status, Some(TtsStatus::Processing));
}

#[tokio::test]
async fn test_reaper_loop_sweeps_on_its_interval() {
    let articles = Arc::new(MemoryArticleRepository::new());
    articles.insert(processing_article(
        Category::Security,
        "wedged",
        Utc::now() - chrono::Duration::hours(1),
    ));

    let reaper = tokio::spawn(run_processing_reaper(
        articles.clone(),
        ReaperSettings {
            interval: Duration::from_millis(20),
            processing_deadline: Duration::from_secs(60),
        },
    ));

    let article =
        wait_for_status(&articles, Category::Security, "wedged", TtsStatus::Error).await;
    assert_eq!(
        article.tts_error_message.as_deref(),
        Some(STUCK_PROCESSING_MESSAGE)
    );

    reaper.abort();
}
