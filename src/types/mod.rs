// src/types/mod.rs
pub mod generation;
pub mod job;
pub mod resume;

pub use generation::{GenerationFailure, GenerationResult};
pub use job::{CoverLetterRecord, ExtractionStatus, JobPosting};
pub use resume::ResumeContext;

/// Every sentinel starts with this prefix; downstream success counting relies on it.
pub const ERROR_PREFIX: &str = "Error";

pub const EXTRACTION_ERROR_SENTINEL: &str = "Error: Could not extract job content";
pub const SCRAPE_ERROR_SENTINEL: &str = "Error scraping job content";
pub const BATCH_ERROR_SENTINEL: &str = "Error generating cover letter";

pub fn is_sentinel(text: &str) -> bool {
    text.starts_with(ERROR_PREFIX)
}
