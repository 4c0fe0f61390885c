use anyhow::bail;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub aws_region: String,
    // TTS provider selection
    pub tts_provider: TtsProvider,
    pub openai_api_key: Option<String>,
    pub openai_tts_model: String,
    // Audio output
    pub audio_bucket: String,
    pub default_language_code: String,
    pub default_voice_name: String,
    // Lifecycle timing
    pub synthesis_timeout_secs: u64,
    pub processing_deadline_secs: u64,
    pub reaper_interval_secs: u64,
    pub environment: Environment,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProvider {
    Polly,
    OpenAi,
}

impl TtsProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            TtsProvider::Polly => "polly",
            TtsProvider::OpenAi => "openai",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "polly" => Some(TtsProvider::Polly),
            "openai" => Some(TtsProvider::OpenAi),
            _ => None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let tts_provider_raw = env::var("TTS_PROVIDER").unwrap_or_else(|_| "polly".to_string());
        let Some(tts_provider) = TtsProvider::parse(&tts_provider_raw) else {
            bail!("unknown TTS_PROVIDER: {tts_provider_raw} (expected polly or openai)");
        };

        let openai_api_key = env::var("OPENAI_API_KEY").ok();
        if tts_provider == TtsProvider::OpenAi && openai_api_key.is_none() {
            bail!("OPENAI_API_KEY is required when TTS_PROVIDER=openai");
        }

        let config = Config {
            database_url: env::var("DATABASE_URL")?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()?,
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            tts_provider,
            openai_api_key,
            openai_tts_model: env::var("OPENAI_TTS_MODEL").unwrap_or_else(|_| "tts-1".to_string()),
            audio_bucket: env::var("AUDIO_BUCKET")?,
            default_language_code: env::var("DEFAULT_LANGUAGE_CODE")
                .unwrap_or_else(|_| crate::domain::tts::voice::DEFAULT_LANGUAGE_CODE.to_string()),
            default_voice_name: env::var("DEFAULT_VOICE_NAME")
                .unwrap_or_else(|_| crate::domain::tts::voice::DEFAULT_VOICE_NAME.to_string()),
            synthesis_timeout_secs: env::var("SYNTHESIS_TIMEOUT_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()?,
            processing_deadline_secs: env::var("PROCESSING_DEADLINE_SECS")
                .unwrap_or_else(|_| "600".to_string())
                .parse()?,
            reaper_interval_secs: env::var("REAPER_INTERVAL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
            environment: match env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string())
                .as_str()
            {
                "production" => Environment::Production,
                _ => Environment::Development,
            },
            log_format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        if config.processing_deadline_secs <= config.synthesis_timeout_secs {
            bail!(
                "PROCESSING_DEADLINE_SECS ({}) must exceed SYNTHESIS_TIMEOUT_SECS ({})",
                config.processing_deadline_secs,
                config.synthesis_timeout_secs
            );
        }

        Ok(config)
    }

    /// Bucket URI audio objects are written under.
    pub fn audio_bucket_uri(&self) -> String {
        format!("s3://{}", self.audio_bucket)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}
