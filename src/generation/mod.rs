// src/generation/mod.rs
pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::LlmConfig;
use crate::types::{GenerationFailure, GenerationResult};

pub use openai::OpenAiClient;

/// Everything one completion call needs
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system_instruction: &'a str,
    pub user_prompt: &'a str,
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// A text-completion backend. Implementations must not retry.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, GenerationFailure>;
}

/// Sends one request per batch and reports the outcome as a value
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn CompletionClient>,
    temperature: f32,
    max_output_tokens: u32,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn CompletionClient>, config: &LlmConfig) -> Self {
        Self {
            backend,
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        }
    }

    pub async fn generate(&self, prompt: &str, system_instruction: &str) -> GenerationResult {
        let request = CompletionRequest {
            system_instruction,
            user_prompt: prompt,
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
        };

        info!("Sending completion request ({} chars)", prompt.chars().count());
        let result = self.backend.complete(request).await;
        match &result {
            Ok(text) => info!("Received completion ({} chars)", text.chars().count()),
            Err(failure) => error!("Completion failed: {}", failure),
        }
        result.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        seen: Mutex<Vec<(String, String, f32, u32)>>,
        reply: Result<String, GenerationFailure>,
    }

    #[async_trait]
    impl CompletionClient for Recording {
        async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, GenerationFailure> {
            self.seen.lock().unwrap().push((
                request.system_instruction.to_string(),
                request.user_prompt.to_string(),
                request.temperature,
                request.max_output_tokens,
            ));
            self.reply.clone()
        }
    }

    #[tokio::test]
    async fn test_generate_passes_sampling_settings() {
        let backend = Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
            reply: Ok("letters".into()),
        });
        let client = GenerationClient::new(backend.clone(), &LlmConfig::default());

        let result = client.generate("prompt", "system").await;
        assert_eq!(result, GenerationResult::Completed("letters".into()));

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ("system".into(), "prompt".into(), 0.7, 4000));
    }

    #[tokio::test]
    async fn test_generate_reports_failure_as_value() {
        let backend = Arc::new(Recording {
            seen: Mutex::new(Vec::new()),
            reply: Err(GenerationFailure::Timeout(45)),
        });
        let client = GenerationClient::new(backend, &LlmConfig::default());

        let result = client.generate("prompt", "system").await;
        assert!(result.is_failure());
        assert_eq!(result.failure(), Some(&GenerationFailure::Timeout(45)));
        assert_eq!(result.raw_text(), None);
    }
}
