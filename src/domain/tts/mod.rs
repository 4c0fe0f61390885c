pub mod error;
pub mod service;
pub mod voice;
pub mod worker;

pub use error::TtsTriggerError;
pub use service::{
    audio_storage_path, SkipReason, TriggerOutcome, TriggerSettings, TtsTriggerService,
    EMPTY_INPUT_MESSAGE,
};
pub use worker::{
    run_processing_reaper, run_trigger_worker, ReaperSettings, STUCK_PROCESSING_MESSAGE,
};
