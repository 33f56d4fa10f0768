// src/lib.rs
//! Batched cover-letter generation: scrape job postings, ask a language model
//! for several letters per request and split the reply back per job.

pub mod cli;
pub mod config;
pub mod demux;
pub mod extraction;
pub mod generation;
pub mod links;
pub mod orchestrator;
pub mod prompt;
pub mod records;
pub mod renderer;
pub mod resume;
pub mod scraper;
pub mod types;
pub mod utils;

pub use config::PipelineConfig;
pub use demux::split_cover_letters;
pub use extraction::ContentExtractor;
pub use generation::{CompletionClient, GenerationClient, OpenAiClient};
pub use orchestrator::{BatchOrchestrator, JobState, RunReport};
pub use prompt::{PromptAssembler, PromptBatch};
pub use renderer::Renderer;
pub use resume::ResumeContextBuilder;
pub use scraper::JobScraper;
pub use types::{CoverLetterRecord, GenerationResult, JobPosting, ResumeContext};
