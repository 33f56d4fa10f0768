// src/types/resume.rs
use std::collections::BTreeSet;

use crate::utils::char_len;

/// Candidate resume representation, built once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeContext {
    pub raw_text: String,
    pub summary: Option<String>,
    pub achievements: Vec<String>,
    pub skills: BTreeSet<String>,
    /// Character length of the resume as supplied, before any truncation
    pub source_chars: usize,
}

impl ResumeContext {
    /// Length charged by the token-ratio budget; never below the kept text
    pub fn source_len(&self) -> usize {
        self.source_chars.max(char_len(&self.raw_text))
    }

    /// Text handed to the prompt: the structured rendering when one exists,
    /// otherwise the raw text.
    pub fn prompt_text(&self) -> String {
        if self.summary.is_none() && self.achievements.is_empty() && self.skills.is_empty() {
            return self.raw_text.clone();
        }

        let mut sections = Vec::new();
        if let Some(summary) = &self.summary {
            sections.push(format!("Summary: {}", summary));
        }
        if !self.achievements.is_empty() {
            let bullets = self
                .achievements
                .iter()
                .map(|a| format!("- {}", a))
                .collect::<Vec<_>>()
                .join("\n");
            sections.push(format!("Key achievements:\n{}", bullets));
        }
        if !self.skills.is_empty() {
            let skills = self.skills.iter().cloned().collect::<Vec<_>>().join(", ");
            sections.push(format!("Skills: {}", skills));
        }
        sections.join("\n\n")
    }
}
