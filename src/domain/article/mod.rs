pub mod model;

pub use model::{Article, Category, TtsStatus};
