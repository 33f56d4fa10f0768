// src/types/generation.rs
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationFailure {
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Failed to parse completion response: {0}")]
    ParseError(String),

    #[error("Request timed out after {0}s")]
    Timeout(u64),
}

/// Outcome of one completion request. Exactly one of text or failure exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    Completed(String),
    Failed(GenerationFailure),
}

impl GenerationResult {
    pub fn raw_text(&self) -> Option<&str> {
        match self {
            Self::Completed(text) => Some(text),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&GenerationFailure> {
        match self {
            Self::Completed(_) => None,
            Self::Failed(failure) => Some(failure),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<Result<String, GenerationFailure>> for GenerationResult {
    fn from(result: Result<String, GenerationFailure>) -> Self {
        match result {
            Ok(text) => Self::Completed(text),
            Err(failure) => Self::Failed(failure),
        }
    }
}
