// src/orchestrator.rs
//! Batch orchestrator - scrape a window of URLs, generate once, split, repeat

use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::config::{BatchConfig, PipelineConfig};
use crate::demux::split_cover_letters;
use crate::generation::GenerationClient;
use crate::prompt::PromptAssembler;
use crate::scraper::JobScraper;
use crate::types::{
    is_sentinel, CoverLetterRecord, GenerationResult, JobPosting, ResumeContext,
    BATCH_ERROR_SENTINEL,
};
use crate::utils::pause_ms;

/// Lifecycle of one job item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Scraped,
    Generated,
    Failed,
}

/// Everything a finished run produced, in input order
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub records: Vec<CoverLetterRecord>,
    pub states: Vec<JobState>,
    pub failed_batches: usize,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn success_count(&self) -> usize {
        self.records.iter().filter(|r| !r.is_error).count()
    }

    pub fn error_count(&self) -> usize {
        self.total() - self.success_count()
    }
}

pub struct BatchOrchestrator {
    scraper: JobScraper,
    assembler: PromptAssembler,
    generator: GenerationClient,
    resume: ResumeContext,
    system_instruction: String,
    batch: BatchConfig,
}

impl BatchOrchestrator {
    /// Takes exclusive ownership of the scraper's renderer; it is closed when the run ends
    pub fn new(
        config: &PipelineConfig,
        scraper: JobScraper,
        generator: GenerationClient,
        resume: ResumeContext,
    ) -> Self {
        Self {
            scraper,
            assembler: PromptAssembler::new(config.prompt.clone(), config.resume.max_chars),
            generator,
            resume,
            system_instruction: config.llm.system_instruction.clone(),
            batch: config.batch.clone(),
        }
    }

    /// Process every URL and release the renderer. Always one record per URL.
    pub async fn run(mut self, urls: &[String]) -> RunReport {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", %run_id);

        async move {
            info!("Starting run over {} job links", urls.len());
            let report = self.process_all(urls).await;
            self.scraper.close().await;

            info!(
                "Successfully generated {} out of {} cover letters",
                report.success_count(),
                report.total()
            );
            report
        }
        .instrument(span)
        .await
    }

    async fn process_all(&mut self, urls: &[String]) -> RunReport {
        let batch_size = self.batch.batch_size.max(1);
        let window_count = urls.len().div_ceil(batch_size);
        let mut report = RunReport::default();

        for (index, window) in urls.chunks(batch_size).enumerate() {
            info!(
                "Processing batch {} of {} ({} jobs)",
                index + 1,
                window_count,
                window.len()
            );

            let outcome = self.process_window(window).await;
            report.records.extend(outcome.records);
            report.states.extend(outcome.states);
            if outcome.generation_failed {
                report.failed_batches += 1;
            }

            if index + 1 < window_count {
                pause_ms(self.batch.batch_delay_ms).await;
            }
        }

        report
    }

    async fn process_window(&mut self, urls: &[String]) -> WindowOutcome {
        let mut states = vec![JobState::Pending; urls.len()];

        let postings = self.scraper.scrape_many(urls).await;
        states.fill(JobState::Scraped);

        let batch = self.assembler.assemble(&self.resume, &postings);
        let result = self
            .generator
            .generate(&batch.prompt, &self.system_instruction)
            .await;

        let (letters, generation_failed) = match result {
            GenerationResult::Completed(text) => (split_cover_letters(&text, postings.len()), false),
            GenerationResult::Failed(failure) => {
                error!("Error processing batch: {}", failure);
                (vec![BATCH_ERROR_SENTINEL.to_string(); postings.len()], true)
            }
        };

        let records = pair_letters(postings, letters, &mut states);
        WindowOutcome {
            records,
            states,
            generation_failed,
        }
    }
}

struct WindowOutcome {
    records: Vec<CoverLetterRecord>,
    states: Vec<JobState>,
    generation_failed: bool,
}

fn pair_letters(
    postings: Vec<JobPosting>,
    letters: Vec<String>,
    states: &mut [JobState],
) -> Vec<CoverLetterRecord> {
    postings
        .into_iter()
        .zip(letters)
        .zip(states.iter_mut())
        .map(|((posting, letter), state)| {
            *state = if is_sentinel(&letter) {
                JobState::Failed
            } else {
                JobState::Generated
            };
            debug!("{} -> {:?}", posting.url, state);
            CoverLetterRecord::new(posting.url, posting.extracted_text, letter)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demux::cover_letter_marker;
    use crate::extraction::ContentExtractor;
    use crate::generation::{CompletionClient, CompletionRequest};
    use crate::scraper::testing::{job_page, FakeRenderer};
    use crate::types::{GenerationFailure, SCRAPE_ERROR_SENTINEL};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::Ordering;
    use std::sync::{Arc, Mutex};

    /// Replays queued replies and records every prompt
    struct ScriptedLlm {
        replies: Mutex<VecDeque<Result<String, GenerationFailure>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(replies: Vec<Result<String, GenerationFailure>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedLlm {
        async fn complete(&self, request: CompletionRequest<'_>) -> Result<String, GenerationFailure> {
            self.prompts.lock().unwrap().push(request.user_prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationFailure::HttpError("no reply".into())))
        }
    }

    fn letters(bodies: &[&str]) -> String {
        bodies
            .iter()
            .enumerate()
            .map(|(i, body)| format!("{}\n{}", cover_letter_marker(i + 1), body))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn orchestrator(
        batch_size: usize,
        renderer: FakeRenderer,
        llm: Arc<ScriptedLlm>,
    ) -> BatchOrchestrator {
        let mut config = PipelineConfig::default();
        config.batch = BatchConfig {
            batch_size,
            scrape_delay_ms: 0,
            batch_delay_ms: 0,
        };
        let scraper = JobScraper::new(
            Box::new(renderer),
            ContentExtractor::new(config.extraction.clone()),
            0,
        );
        let generator = GenerationClient::new(llm, &config.llm);
        BatchOrchestrator::new(
            &config,
            scraper,
            generator,
            ResumeContext {
                raw_text: "resume".into(),
                ..Default::default()
            },
        )
    }

    fn urls(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("https://example.com/job/{}", i)).collect()
    }

    fn renderer_for(urls: &[String]) -> FakeRenderer {
        urls.iter().enumerate().fold(FakeRenderer::new(), |r, (i, url)| {
            r.page(url, &job_page(&format!("Company{}", i + 1)))
        })
    }

    #[tokio::test]
    async fn test_batch_failure_is_isolated() {
        let all = urls(6);
        let renderer = renderer_for(&all);
        let closed = renderer.closed.clone();
        let llm = ScriptedLlm::new(vec![
            Err(GenerationFailure::HttpError("status 500".into())),
            Ok(letters(&["Letter four", "Letter five", "Letter six"])),
        ]);

        let report = orchestrator(3, renderer, llm.clone()).run(&all).await;

        assert_eq!(report.total(), 6);
        assert_eq!(report.failed_batches, 1);
        for record in &report.records[..3] {
            assert_eq!(record.cover_letter, BATCH_ERROR_SENTINEL);
            assert!(record.is_error);
        }
        assert_eq!(report.records[3].cover_letter, "Letter four");
        assert_eq!(report.records[5].cover_letter, "Letter six");
        assert_eq!(report.success_count(), 3);
        assert_eq!(report.error_count(), 3);
        assert_eq!(report.states[0], JobState::Failed);
        assert_eq!(report.states[4], JobState::Generated);
        assert_eq!(llm.prompts.lock().unwrap().len(), 2);
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_order_preserved_across_batches() {
        let all = urls(7);
        let llm = ScriptedLlm::new(vec![
            Ok(letters(&["L1", "L2", "L3"])),
            // marker for the second job of this window is missing
            Ok(format!("{}\nL4\n\n{}\nL6", cover_letter_marker(1), cover_letter_marker(3))),
            Err(GenerationFailure::Timeout(45)),
        ]);

        let report = orchestrator(3, renderer_for(&all), llm.clone()).run(&all).await;

        let got: Vec<&str> = report.records.iter().map(|r| r.job_url.as_str()).collect();
        let want: Vec<&str> = all.iter().map(String::as_str).collect();
        assert_eq!(got, want);

        let letters: Vec<&str> = report.records.iter().map(|r| r.cover_letter.as_str()).collect();
        assert_eq!(letters[0..3], ["L1", "L2", "L3"]);
        assert_eq!(letters[4], "Error: Could not find cover letter for job 2");
        assert_eq!(letters[5], "L6");
        assert_eq!(letters[6], BATCH_ERROR_SENTINEL);

        for (i, record) in report.records.iter().enumerate() {
            assert!(record.job_content.contains(&format!("Company{} ", i + 1)));
        }

        // the last window holds a single job
        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 3);
        assert!(prompts[2].contains("### JOB POSTING 1 ###"));
        assert!(!prompts[2].contains("### JOB POSTING 2 ###"));
    }

    #[tokio::test]
    async fn test_scrape_error_keeps_alignment() {
        let renderer = FakeRenderer::new()
            .page("https://example.com/a", &job_page("Alpha"))
            .page("https://example.com/c", &job_page("Gamma"));
        let llm = ScriptedLlm::new(vec![Ok(letters(&["A", "B", "C"]))]);
        let input = vec![
            "https://example.com/a".to_string(),
            "https://example.com/broken".to_string(),
            "https://example.com/c".to_string(),
        ];

        let report = orchestrator(5, renderer, llm.clone()).run(&input).await;

        assert_eq!(report.records[1].job_content, SCRAPE_ERROR_SENTINEL);
        assert_eq!(report.records[1].cover_letter, "B");
        assert_eq!(report.records[2].cover_letter, "C");

        let prompt = &llm.prompts.lock().unwrap()[0];
        assert!(prompt.contains(&format!("### JOB POSTING 2 ###\n{}", SCRAPE_ERROR_SENTINEL)));
    }

    #[tokio::test]
    async fn test_empty_input_still_releases_renderer() {
        let renderer = FakeRenderer::new();
        let closed = renderer.closed.clone();
        let llm = ScriptedLlm::new(vec![]);

        let report = orchestrator(3, renderer, llm.clone()).run(&[]).await;

        assert_eq!(report.total(), 0);
        assert!(llm.prompts.lock().unwrap().is_empty());
        assert!(closed.load(Ordering::SeqCst));
    }
}
