// src/prompt.rs
//! Packs a resume and several job postings into one size-bounded prompt.
//!
//! Sizes are character heuristics; no tokenizer is involved.

use tracing::{debug, warn};

use crate::config::{BudgetMode, PromptConfig};
use crate::demux::cover_letter_marker;
use crate::types::{JobPosting, ResumeContext};
use crate::utils::truncate_chars;

/// Characters per token assumed by `BudgetMode::TokenRatio`
pub const CHARS_PER_TOKEN: usize = 4;

/// How far the finished prompt may exceed the ceiling: the instruction
/// template and per-job headers are only estimated by `overhead_chars`.
pub const PROMPT_TOLERANCE_CHARS: usize = 1024;

pub fn job_header(ordinal: usize) -> String {
    format!("### JOB POSTING {} ###", ordinal)
}

/// One assembled request
#[derive(Debug, Clone)]
pub struct PromptBatch<'a> {
    pub job_items: &'a [JobPosting],
    pub resume_context: &'a ResumeContext,
    pub char_budget_per_job: usize,
    /// Characters left for job text after the resume slice and overhead; may be negative
    pub available_chars: i64,
    pub prompt: String,
}

impl PromptBatch<'_> {
    pub fn len(&self) -> usize {
        self.job_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.job_items.is_empty()
    }
}

pub struct PromptAssembler {
    config: PromptConfig,
    resume_slice_chars: usize,
}

impl PromptAssembler {
    pub fn new(config: PromptConfig, resume_slice_chars: usize) -> Self {
        Self {
            config,
            resume_slice_chars,
        }
    }

    /// Characters left for job text, before division
    pub fn available_chars(&self, resume: &ResumeContext) -> i64 {
        let ceiling = self.config.ceiling_chars as i64;
        let overhead = self.config.overhead_chars as i64;
        match self.config.budget_mode {
            BudgetMode::Chars => ceiling - self.resume_slice_chars as i64 - overhead,
            // ceiling and overhead are tokens here; the resume is charged at its full length
            BudgetMode::TokenRatio => {
                let resume_tokens = (resume.source_len() / CHARS_PER_TOKEN) as i64;
                (ceiling - resume_tokens - overhead) * CHARS_PER_TOKEN as i64
            }
        }
    }

    /// Per-job character budget; clamped to the configured floor when the
    /// budget cannot give every job at least one character
    pub fn budget_per_job(&self, available: i64, job_count: usize) -> usize {
        if job_count == 0 {
            return 0;
        }
        if available < job_count as i64 {
            warn!(
                "No room left for {} job(s), clamping to {} chars each",
                job_count, self.config.min_chars_per_job
            );
            return self.config.min_chars_per_job.max(1);
        }
        (available as usize) / job_count
    }

    pub fn assemble<'a>(
        &self,
        resume_context: &'a ResumeContext,
        job_items: &'a [JobPosting],
    ) -> PromptBatch<'a> {
        let available_chars = self.available_chars(resume_context);
        let per_job = self.budget_per_job(available_chars, job_items.len());
        debug!(
            "Prompt budget: available={} per_job={} jobs={}",
            available_chars,
            per_job,
            job_items.len()
        );

        let resume_text = truncate_chars(&resume_context.prompt_text(), self.resume_slice_chars);
        let jobs_block = job_items
            .iter()
            .enumerate()
            .map(|(i, job)| {
                format!(
                    "{}\n{}",
                    job_header(i + 1),
                    truncate_chars(&job.extracted_text, per_job)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = self.render(job_items.len(), &resume_text, &jobs_block);

        PromptBatch {
            job_items,
            resume_context,
            char_budget_per_job: per_job,
            available_chars,
            prompt,
        }
    }

    fn render(&self, count: usize, resume_text: &str, jobs_block: &str) -> String {
        format!(
            "Based on the following resume and {count} job postings, write distinct professional cover letters for each position.

Resume:
{resume_text}

Job Postings:
{jobs_block}

Write exactly {count} cover letters, in job order. Start each one with the line \"### COVER LETTER FOR JOB <i> ###\" where <i> is the job number from 1 to {count}, for example:

{first_marker}
[Cover letter content here]

Write nothing before the first marker and nothing between letters except the letter text.

Each cover letter should:
1. Extract relevant job details from the content (title, company, requirements)
2. Highlight matching skills and experience from the resume
3. Use specific examples to demonstrate qualifications
4. Show enthusiasm for the role and company
5. Maintain a professional tone
6. Be concise (max {max_words} words per letter)",
            first_marker = cover_letter_marker(1),
            max_words = self.config.max_words_per_letter,
        )
    }
}
