use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use briefcast_backend::controllers::TtsController;
use briefcast_backend::domain::article::Category;
use briefcast_backend::domain::tts::{
    run_processing_reaper, run_trigger_worker, ReaperSettings, TriggerSettings, TtsTriggerService,
};
use briefcast_backend::infrastructure::config::{Config, LogFormat, TtsProvider};
use briefcast_backend::infrastructure::db::{check_connection, create_pool, run_migrations};
use briefcast_backend::infrastructure::events::{PgWriteEventSource, WriteEventSource};
use briefcast_backend::infrastructure::http::start_http_server;
use briefcast_backend::infrastructure::repositories::{
    ArticleRepository, OpenAiLongAudioRepository, PgArticleRepository, PollyLongAudioRepository,
    SynthesisRepository,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Briefcast TTS backend on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool and apply migrations
    let pool = create_pool(&config.database_url).await?;
    check_connection(&pool).await?;
    run_migrations(&pool).await?;
    tracing::info!("Database connection verified, migrations applied");

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(config.aws_region.clone()))
        .load()
        .await;
    let s3_client = Arc::new(aws_sdk_s3::Client::new(&aws_config));

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Synthesis provider (behind the long-audio port)
    let synthesizer: Arc<dyn SynthesisRepository> = match config.tts_provider {
        TtsProvider::Polly => {
            tracing::info!(region = %config.aws_region, "Using AWS Polly synthesis provider");
            let polly_client = Arc::new(aws_sdk_polly::Client::new(&aws_config));
            Arc::new(PollyLongAudioRepository::new(
                polly_client,
                s3_client.clone(),
            ))
        }
        TtsProvider::OpenAi => {
            tracing::info!(model = %config.openai_tts_model, "Using OpenAI synthesis provider");
            let Some(api_key) = config.openai_api_key.clone() else {
                anyhow::bail!("OPENAI_API_KEY is required when TTS_PROVIDER=openai");
            };
            let openai_config = async_openai::config::OpenAIConfig::new().with_api_key(api_key);
            let client = Arc::new(async_openai::Client::with_config(openai_config));
            Arc::new(OpenAiLongAudioRepository::new(
                client,
                s3_client.clone(),
                config.openai_tts_model.clone(),
            ))
        }
    };

    // 2. Document store and event source
    let articles: Arc<dyn ArticleRepository> = Arc::new(PgArticleRepository::new(pool.clone()));
    let event_source: Arc<dyn WriteEventSource> = Arc::new(PgWriteEventSource::new(pool.clone()));

    // 3. Trigger service
    let trigger_service = Arc::new(TtsTriggerService::new(
        articles.clone(),
        synthesizer,
        TriggerSettings {
            audio_bucket_uri: config.audio_bucket_uri(),
            default_language_code: config.default_language_code.clone(),
            default_voice_name: config.default_voice_name.clone(),
            synthesis_timeout: Duration::from_secs(config.synthesis_timeout_secs),
        },
    ));

    // 4. One trigger worker per category collection, plus the reaper
    for category in Category::ALL {
        tokio::spawn(run_trigger_worker(
            category,
            event_source.clone(),
            trigger_service.clone(),
        ));
    }
    tokio::spawn(run_processing_reaper(
        articles.clone(),
        ReaperSettings {
            interval: Duration::from_secs(config.reaper_interval_secs),
            processing_deadline: Duration::from_secs(config.processing_deadline_secs),
        },
    ));

    // 5. HTTP surface
    let tts_controller = Arc::new(TtsController::new(articles));

    start_http_server(pool, config, tts_controller)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "briefcast_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "briefcast_backend=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
