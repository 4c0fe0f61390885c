mod audio_output;
mod batching;

pub mod article_repository;
pub mod openai_synthesis_repository;
pub mod pg_article_repository;
pub mod polly_synthesis_repository;
pub mod synthesis_repository;

pub use article_repository::{ArticleRepository, ArticleRepositoryError};
pub use openai_synthesis_repository::OpenAiLongAudioRepository;
pub use pg_article_repository::PgArticleRepository;
pub use polly_synthesis_repository::PollyLongAudioRepository;
pub use synthesis_repository::{
    AudioEncoding, SynthesisError, SynthesisOperation, SynthesisOutcome, SynthesisRepository,
    SynthesisRequest,
};
