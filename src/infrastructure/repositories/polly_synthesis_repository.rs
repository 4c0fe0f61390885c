use super::audio_output::{parse_s3_uri, pcm_to_wav};
use super::batching::split_into_batches;
use super::synthesis_repository::{
    AudioEncoding, SynthesisError, SynthesisOperation, SynthesisOutcome, SynthesisRepository,
    SynthesisRequest,
};
use crate::domain::tts::voice::is_voice_neural_compatible;
use async_trait::async_trait;
use aws_sdk_polly::{
    types::{Engine, LanguageCode, OutputFormat, VoiceId},
    Client as PollyClient,
};
use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};
use std::sync::Arc;
use uuid::Uuid;

/// AWS Polly has a limit of 3000 characters per request
const MAX_BATCH_SIZE: usize = 3000;

/// Polly emits 16-bit mono PCM at this rate
const PCM_SAMPLE_RATE: u32 = 16_000;

/// AWS Polly implementation of the long-audio synthesis port.
///
/// Polly itself is a short-audio API, so a job here is: split the text
/// into batches, synthesize each as raw PCM, merge in order, frame as
/// WAV, and upload the object to the request's S3 URI.
#[derive(Clone)]
pub struct PollyLongAudioRepository {
    polly: Arc<PollyClient>,
    s3: Arc<S3Client>,
}

impl PollyLongAudioRepository {
    pub fn new(polly: Arc<PollyClient>, s3: Arc<S3Client>) -> Self {
        Self { polly, s3 }
    }

    /// Call AWS Polly to synthesize a single text batch as raw PCM
    async fn call_polly(
        &self,
        text: &str,
        language_code: &str,
        voice_name: &str,
    ) -> Result<Vec<u8>, SynthesisError> {
        let voice_id = VoiceId::from(voice_name);
        let engine = if is_voice_neural_compatible(voice_name) {
            Engine::Neural
        } else {
            Engine::Standard
        };

        tracing::info!(
            language_code = language_code,
            voice = voice_name,
            engine = ?engine,
            output_format = "Pcm",
            text_length = text.len(),
            "Calling AWS Polly synthesize_speech"
        );

        let result = self
            .polly
            .synthesize_speech()
            .text(text)
            .voice_id(voice_id)
            .language_code(LanguageCode::from(language_code))
            .output_format(OutputFormat::Pcm)
            .sample_rate(PCM_SAMPLE_RATE.to_string())
            .engine(engine.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    language_code = language_code,
                    voice = voice_name,
                    engine = ?engine,
                    text_length = text.len(),
                    "AWS Polly synthesize_speech failed"
                );
                SynthesisError::Provider(format!("AWS Polly error: {:?}", e))
            })?;

        let audio_stream = result.audio_stream.collect().await.map_err(|e| {
            SynthesisError::Provider(format!("failed to read Polly audio stream: {}", e))
        })?;

        Ok(audio_stream.into_bytes().to_vec())
    }

    /// Synthesize all batches and merge the PCM results in order
    async fn synthesize_batches(
        &self,
        batches: &[String],
        language_code: &str,
        voice_name: &str,
    ) -> Result<Vec<u8>, SynthesisError> {
        let mut merged_pcm = Vec::new();

        for (index, batch) in batches.iter().enumerate() {
            tracing::debug!(
                batch_index = index,
                batch_size = batch.len(),
                "Synthesizing batch"
            );

            let pcm = self.call_polly(batch, language_code, voice_name).await?;
            merged_pcm.extend(pcm);
        }

        Ok(merged_pcm)
    }

    async fn run_job(
        self,
        request: SynthesisRequest,
        bucket: String,
        key: String,
    ) -> Result<SynthesisOutcome, SynthesisError> {
        let start_time = std::time::Instant::now();

        let batches = split_into_batches(&request.text, MAX_BATCH_SIZE);
        tracing::info!(
            batch_count = batches.len(),
            text_length = request.text.len(),
            "Text split into batches"
        );

        let pcm = self
            .synthesize_batches(&batches, &request.language_code, &request.voice_name)
            .await?;
        let wav = pcm_to_wav(&pcm, PCM_SAMPLE_RATE, 1, 16);
        let audio_size_bytes = wav.len();

        self.s3
            .put_object()
            .bucket(&bucket)
            .key(&key)
            .content_type("audio/wav")
            .body(ByteStream::from(wav))
            .send()
            .await
            .map_err(|e| SynthesisError::Storage(format!("S3 put_object failed: {:?}", e)))?;

        let duration = start_time.elapsed();
        tracing::info!(
            provider = "polly",
            latency_ms = duration.as_millis(),
            characters_count = request.text.len(),
            batch_count = batches.len(),
            audio_size_bytes = audio_size_bytes,
            output_uri = %request.output_uri,
            "Long-audio synthesis completed"
        );

        Ok(SynthesisOutcome {
            output_uri: request.output_uri,
            audio_size_bytes,
        })
    }
}

#[async_trait]
impl SynthesisRepository for PollyLongAudioRepository {
    async fn start_synthesis(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesisOperation, SynthesisError> {
        debug_assert_eq!(request.encoding, AudioEncoding::Linear16);

        if request.text.trim().is_empty() {
            return Err(SynthesisError::InvalidRequest(
                "text must not be empty".to_string(),
            ));
        }
        let (bucket, key) = parse_s3_uri(&request.output_uri)?;

        let operation_id = Uuid::new_v4().to_string();
        tracing::info!(
            operation_id = %operation_id,
            voice = %request.voice_name,
            language_code = %request.language_code,
            text_length = request.text.len(),
            output_uri = %request.output_uri,
            "Starting Polly long-audio operation"
        );

        let repo = self.clone();
        Ok(SynthesisOperation::spawn(
            operation_id,
            repo.run_job(request, bucket, key),
        ))
    }
}
