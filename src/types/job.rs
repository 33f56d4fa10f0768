// src/types/job.rs
use super::is_sentinel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionStatus {
    /// A selector group yielded substantive fragments
    Ok,
    /// Full-page or renderer visible text was used instead
    Fallback,
    /// Nothing usable; `extracted_text` holds a sentinel
    Error,
}

/// One job posting, created when its URL is scraped.
#[derive(Debug, Clone)]
pub struct JobPosting {
    pub url: String,
    pub raw_html: Option<String>,
    pub extracted_text: String,
    pub extraction_status: ExtractionStatus,
}

impl JobPosting {
    pub fn new(url: impl Into<String>, extracted_text: String, status: ExtractionStatus) -> Self {
        Self {
            url: url.into(),
            raw_html: None,
            extracted_text,
            extraction_status: status,
        }
    }

    pub fn with_raw_html(mut self, html: String) -> Self {
        self.raw_html = Some(html);
        self
    }

    pub fn failed(url: impl Into<String>, sentinel: &str) -> Self {
        Self::new(url, sentinel.to_string(), ExtractionStatus::Error)
    }
}

/// The unit persisted to the output table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverLetterRecord {
    pub job_url: String,
    pub job_content: String,
    pub cover_letter: String,
    pub is_error: bool,
}

impl CoverLetterRecord {
    pub fn new(job_url: String, job_content: String, cover_letter: String) -> Self {
        let is_error = is_sentinel(&cover_letter);
        Self {
            job_url,
            job_content,
            cover_letter,
            is_error,
        }
    }
}
