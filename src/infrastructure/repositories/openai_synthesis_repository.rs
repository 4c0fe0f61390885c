use super::audio_output::{parse_s3_uri, pcm_to_wav};
use super::batching::split_into_batches;
use super::synthesis_repository::{
    AudioEncoding, SynthesisError, SynthesisOperation, SynthesisOutcome, SynthesisRepository,
    SynthesisRequest,
};
use async_trait::async_trait;
use async_openai::{
    config::OpenAIConfig,
    types::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};
use std::sync::Arc;
use uuid::Uuid;

/// OpenAI has a limit of 4096 characters per request
const MAX_BATCH_SIZE: usize = 4096;

/// OpenAI PCM responses are 16-bit mono at this rate
const PCM_SAMPLE_RATE: u32 = 24_000;

/// OpenAI TTS implementation of the long-audio synthesis port.
///
/// Same job shape as the Polly implementation: batch, synthesize PCM,
/// merge, frame as WAV, upload to S3. OpenAI voices are fixed-language,
/// so the request's language code only shows up in logs here.
#[derive(Clone)]
pub struct OpenAiLongAudioRepository {
    client: Arc<Client<OpenAIConfig>>,
    s3: Arc<S3Client>,
    model: String,
}

impl OpenAiLongAudioRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, s3: Arc<S3Client>, model: String) -> Self {
        Self { client, s3, model }
    }

    /// Map a requested voice name onto the OpenAI voice set, defaulting
    /// to alloy for anything unrecognized (e.g. a Polly voice name left
    /// on the document).
    fn resolve_voice(voice_name: &str) -> Voice {
        match voice_name.to_lowercase().as_str() {
            "alloy" => Voice::Alloy,
            "echo" => Voice::Echo,
            "fable" => Voice::Fable,
            "onyx" => Voice::Onyx,
            "nova" => Voice::Nova,
            "shimmer" => Voice::Shimmer,
            _ => Voice::Alloy,
        }
    }

    /// Call the OpenAI speech API for a single text batch as raw PCM
    async fn call_openai(&self, text: &str, voice: Voice) -> Result<Vec<u8>, SynthesisError> {
        let model = match self.model.as_str() {
            "tts-1" => SpeechModel::Tts1,
            "tts-1-hd" => SpeechModel::Tts1Hd,
            other => SpeechModel::Other(other.to_string()),
        };

        tracing::info!(
            model = %self.model,
            voice = ?voice,
            text_length = text.len(),
            "Calling OpenAI TTS API"
        );

        let request = CreateSpeechRequest {
            model,
            input: text.to_string(),
            voice,
            response_format: Some(SpeechResponseFormat::Pcm),
            speed: None,
        };

        let response = self.client.audio().speech(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                text_length = text.len(),
                "OpenAI TTS API call failed"
            );
            SynthesisError::Provider(format!("OpenAI TTS error: {}", e))
        })?;

        Ok(response.bytes.to_vec())
    }

    async fn run_job(
        self,
        request: SynthesisRequest,
        bucket: String,
        key: String,
    ) -> Result<SynthesisOutcome, SynthesisError> {
        let start_time = std::time::Instant::now();
        let voice = Self::resolve_voice(&request.voice_name);

        let batches = split_into_batches(&request.text, MAX_BATCH_SIZE);
        tracing::info!(
            batch_count = batches.len(),
            text_length = request.text.len(),
            "Text split into batches"
        );

        let mut merged_pcm = Vec::new();
        for (index, batch) in batches.iter().enumerate() {
            tracing::debug!(
                batch_index = index,
                batch_size = batch.len(),
                "Synthesizing batch"
            );
            let pcm = self.call_openai(batch, voice.clone()).await?;
            merged_pcm.extend(pcm);
        }

        let wav = pcm_to_wav(&merged_pcm, PCM_SAMPLE_RATE, 1, 16);
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
            provider = "openai",
            model = %self.model,
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
impl SynthesisRepository for OpenAiLongAudioRepository {
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
            model = %self.model,
            text_length = request.text.len(),
            output_uri = %request.output_uri,
            "Starting OpenAI long-audio operation"
        );

        let repo = self.clone();
        Ok(SynthesisOperation::spawn(
            operation_id,
            repo.run_job(request, bucket, key),
        ))
    }
}
