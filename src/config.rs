// src/config.rs
//! Pipeline configuration - loaded once from YAML, then passed to each component

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub batch: BatchConfig,
    pub renderer: RendererConfig,
    pub extraction: ExtractionConfig,
    pub resume: ResumeConfig,
    pub prompt: PromptConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub batch_size: usize,
    /// Pause between two scrapes inside a window
    pub scrape_delay_ms: u64,
    /// Pause between two windows
    pub batch_delay_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            scrape_delay_ms: 2000,
            batch_delay_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    Chrome,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub kind: RendererKind,
    /// Wait after navigation so client-side rendering can finish
    pub settle_delay_ms: u64,
    pub timeout_secs: u64,
    pub headless: bool,
    pub user_agent: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            kind: RendererKind::Chrome,
            settle_delay_ms: 3000,
            timeout_secs: 30,
            headless: true,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionProfile {
    /// Platform selectors, substantive paragraphs only
    Precise,
    /// Every non-empty p/div/span/li text of the page
    Broad,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub profile: ExtractionProfile,
    /// Fragments must have strictly more words than this
    pub min_words: usize,
    /// Keep only the K longest fragments per matched element
    pub top_k: Option<usize>,
    pub max_chars: usize,
    pub fallback_max_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            profile: ExtractionProfile::Precise,
            min_words: 5,
            top_k: None,
            max_chars: 2000,
            fallback_max_chars: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeStrategy {
    Raw,
    Structured,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeConfig {
    pub strategy: ResumeStrategy,
    pub max_chars: usize,
}

impl Default for ResumeConfig {
    fn default() -> Self {
        Self {
            strategy: ResumeStrategy::Raw,
            max_chars: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetMode {
    /// Ceiling and overhead are character counts
    Chars,
    /// Ceiling and overhead are token counts, converted at a fixed chars-per-token ratio
    TokenRatio,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub ceiling_chars: usize,
    pub overhead_chars: usize,
    pub min_chars_per_job: usize,
    pub budget_mode: BudgetMode,
    pub max_words_per_letter: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            ceiling_chars: 7000,
            overhead_chars: 500,
            min_chars_per_job: 200,
            budget_mode: BudgetMode::Chars,
            max_words_per_letter: 400,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_secs: u64,
    pub system_instruction: String,
    /// Never read from the YAML file, only from the environment
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_output_tokens: 4000,
            timeout_secs: 45,
            system_instruction: "You are a professional cover letter writer.".to_string(),
            api_key: None,
        }
    }
}

impl PipelineConfig {
    /// Load configuration from the given path, `COVER_LETTER_CONFIG`, or `config.yaml`.
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("COVER_LETTER_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            info!("Loading configuration from {}", path.display());
            Self::load_from_file(&path)?
        } else {
            warn!("{} not found, using default configuration", path.display());
            Self::default()
        };

        config.llm.api_key = Self::api_key_from_env();
        config.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    fn api_key_from_env() -> Option<String> {
        std::env::var("LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.batch_size == 0 {
            anyhow::bail!("batch.batch_size must be at least 1");
        }
        if self.prompt.ceiling_chars == 0 {
            anyhow::bail!("prompt.ceiling_chars must be positive");
        }
        if self.extraction.max_chars == 0 || self.extraction.fallback_max_chars == 0 {
            anyhow::bail!("extraction caps must be positive");
        }
        Ok(())
    }
}
