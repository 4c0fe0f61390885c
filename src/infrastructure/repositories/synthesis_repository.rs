use async_trait::async_trait;
use std::future::Future;
use tokio::task::JoinHandle;

/// Audio encodings the synthesis port accepts. Long-audio synthesis only
/// supports linear PCM, delivered as a WAV container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEncoding {
    Linear16,
}

impl AudioEncoding {
    pub fn file_extension(&self) -> &'static str {
        match self {
            AudioEncoding::Linear16 => "wav",
        }
    }
}

/// Request shape for one long-audio synthesis job.
///
/// `output_uri` is the fully-qualified object-store location the provider
/// writes the finished audio to; the caller never receives audio bytes.
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub language_code: String,
    pub voice_name: String,
    pub encoding: AudioEncoding,
    pub output_uri: String,
}

/// What a completed synthesis job reports back.
#[derive(Debug, Clone)]
pub struct SynthesisOutcome {
    pub output_uri: String,
    pub audio_size_bytes: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("invalid synthesis request: {0}")]
    InvalidRequest(String),

    #[error("synthesis provider error: {0}")]
    Provider(String),

    #[error("audio storage error: {0}")]
    Storage(String),

    #[error("synthesis operation aborted: {0}")]
    Aborted(String),
}

/// Handle to an in-flight long-audio synthesis job.
///
/// Submission returns this handle immediately; the result arrives through
/// `wait`, the single suspension point of the trigger. The handle is the
/// provider-portable analog of a cloud long-running operation: submit,
/// await completion, get a result or an error, with no partial results.
pub struct SynthesisOperation {
    operation_id: String,
    handle: JoinHandle<Result<SynthesisOutcome, SynthesisError>>,
}

impl SynthesisOperation {
    /// Run `job` as a detached task and wrap it in an operation handle.
    pub fn spawn<F>(operation_id: String, job: F) -> Self
    where
        F: Future<Output = Result<SynthesisOutcome, SynthesisError>> + Send + 'static,
    {
        Self {
            operation_id,
            handle: tokio::spawn(job),
        }
    }

    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Suspend until the job finishes. Takes `&mut self` so callers can
    /// still `abort` after a `wait` wrapped in a timeout expires.
    pub async fn wait(&mut self) -> Result<SynthesisOutcome, SynthesisError> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(err) => Err(SynthesisError::Aborted(err.to_string())),
        }
    }

    /// Cancel the underlying job. A subsequent `wait` yields `Aborted`.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

/// Provider port for long-audio speech synthesis.
///
/// Implementations own the whole job: batching around provider limits,
/// audio container framing, and the object-store write to `output_uri`.
#[async_trait]
pub trait SynthesisRepository: Send + Sync {
    /// Submit a synthesis job. Request validation failures surface here;
    /// everything that happens after submission surfaces through the
    /// returned operation handle.
    async fn start_synthesis(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesisOperation, SynthesisError>;
}
