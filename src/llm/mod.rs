// src/llm/mod.rs
pub mod client;
pub mod models;
pub mod prompt;

// Re-export key extraction types for convenience
pub use self::{
    client::{CompletionService, OpenAiClient},
    models::ExtractionResult,
};
