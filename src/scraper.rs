// src/scraper.rs
use tracing::{error, info, warn};

use crate::extraction::{ContentExtractor, Platform};
use crate::renderer::{hooks_for, RenderError, Renderer};
use crate::types::{ExtractionStatus, JobPosting, EXTRACTION_ERROR_SENTINEL, SCRAPE_ERROR_SENTINEL};
use crate::utils::{collapse_whitespace, pause_ms, truncate_chars};

/// Drives one renderer session and turns each URL into a `JobPosting`.
///
/// Never fails per URL: render errors become the scrape-error sentinel.
pub struct JobScraper {
    renderer: Option<Box<dyn Renderer>>,
    extractor: ContentExtractor,
    scrape_delay_ms: u64,
}

impl JobScraper {
    pub fn new(renderer: Box<dyn Renderer>, extractor: ContentExtractor, scrape_delay_ms: u64) -> Self {
        Self {
            renderer: Some(renderer),
            extractor,
            scrape_delay_ms,
        }
    }

    /// Scrape `urls` in order, pausing between consecutive pages
    pub async fn scrape_many(&mut self, urls: &[String]) -> Vec<JobPosting> {
        let mut postings = Vec::with_capacity(urls.len());
        for (i, url) in urls.iter().enumerate() {
            if i > 0 {
                pause_ms(self.scrape_delay_ms).await;
            }
            postings.push(self.scrape(url).await);
        }
        postings
    }

    /// Scrape everything, then release the renderer
    pub async fn scrape_all(mut self, urls: &[String]) -> Vec<JobPosting> {
        let postings = self.scrape_many(urls).await;
        self.close().await;
        postings
    }

    pub async fn scrape(&mut self, url: &str) -> JobPosting {
        match self.try_scrape(url).await {
            Ok(posting) => {
                info!("Successfully scraped content from: {}", url);
                posting
            }
            Err(e) => {
                error!("Error scraping {}: {}", url, e);
                JobPosting::failed(url, SCRAPE_ERROR_SENTINEL)
            }
        }
    }

    async fn try_scrape(&mut self, url: &str) -> Result<JobPosting, RenderError> {
        let renderer = self.renderer.as_mut().ok_or(RenderError::Closed)?;
        renderer.navigate(url).await?;

        for hook in hooks_for(Platform::from_url(url)) {
            if let Err(e) = renderer.interact(*hook).await {
                warn!("Interaction {:?} failed on {}: {}", hook, url, e);
            }
        }

        let html = renderer.rendered_html().await?;
        let extraction = self.extractor.extract_detailed(&html, url);

        let posting = if extraction.status == ExtractionStatus::Error {
            let body = match renderer.visible_text().await {
                Ok(text) => collapse_whitespace(&text),
                Err(e) => {
                    warn!("Could not read visible text of {}: {}", url, e);
                    String::new()
                }
            };
            if body.is_empty() {
                JobPosting::failed(url, EXTRACTION_ERROR_SENTINEL)
            } else {
                warn!("Using visible body text for {}", url);
                let cap = self.extractor.config().fallback_max_chars;
                JobPosting::new(url, truncate_chars(&body, cap), ExtractionStatus::Fallback)
            }
        } else {
            JobPosting::new(url, extraction.text, extraction.status)
        };

        Ok(posting.with_raw_html(html))
    }

    /// Idempotent; later scrapes yield the scrape-error sentinel
    pub async fn close(&mut self) {
        if let Some(mut renderer) = self.renderer.take() {
            renderer.close().await;
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::renderer::{InteractionHook, RenderError, Renderer};

    /// Serves canned pages; URLs containing "broken" fail to navigate
    pub struct FakeRenderer {
        pages: HashMap<String, String>,
        current: Option<String>,
        pub body_text: String,
        pub closed: Arc<AtomicBool>,
        pub interactions: Arc<Mutex<Vec<InteractionHook>>>,
    }

    impl FakeRenderer {
        pub fn new() -> Self {
            Self {
                pages: HashMap::new(),
                current: None,
                body_text: "visible body text".into(),
                closed: Arc::new(AtomicBool::new(false)),
                interactions: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), html.to_string());
            self
        }
    }

    #[async_trait]
    impl Renderer for FakeRenderer {
        async fn navigate(&mut self, url: &str) -> Result<(), RenderError> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(RenderError::Closed);
            }
            if url.contains("broken") {
                return Err(RenderError::Navigation {
                    url: url.into(),
                    message: "timeout".into(),
                });
            }
            self.current = Some(url.to_string());
            Ok(())
        }

        async fn interact(&mut self, hook: InteractionHook) -> Result<(), RenderError> {
            self.interactions.lock().unwrap().push(hook);
            Ok(())
        }

        async fn rendered_html(&mut self) -> Result<String, RenderError> {
            let url = self.current.as_ref().ok_or(RenderError::NotNavigated)?;
            Ok(self.pages.get(url).cloned().unwrap_or_default())
        }

        async fn visible_text(&mut self) -> Result<String, RenderError> {
            Ok(self.body_text.clone())
        }

        async fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    pub fn job_page(text: &str) -> String {
        format!(
            "<html><body><main><p>{} needs a careful engineer on the team</p></main></body></html>",
            text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{job_page, FakeRenderer};
    use super::*;
    use crate::config::ExtractionConfig;
    use crate::renderer::InteractionHook;
    use std::sync::atomic::Ordering;

    fn scraper(renderer: FakeRenderer) -> JobScraper {
        JobScraper::new(
            Box::new(renderer),
            ContentExtractor::new(ExtractionConfig::default()),
            0,
        )
    }

    #[tokio::test]
    async fn test_selector_extraction() {
        let renderer = FakeRenderer::new().page("https://example.com/1", &job_page("Acme"));
        let posting = scraper(renderer).scrape("https://example.com/1").await;

        assert_eq!(posting.extraction_status, ExtractionStatus::Ok);
        assert_eq!(posting.extracted_text, "Acme needs a careful engineer on the team");
        assert!(posting.raw_html.unwrap().contains("<main>"));
    }

    #[tokio::test]
    async fn test_navigation_failure_is_sentinel() {
        let posting = scraper(FakeRenderer::new())
            .scrape("https://example.com/broken")
            .await;
        assert_eq!(posting.extracted_text, SCRAPE_ERROR_SENTINEL);
        assert_eq!(posting.extraction_status, ExtractionStatus::Error);
        assert!(posting.raw_html.is_none());
    }

    #[tokio::test]
    async fn test_empty_extraction_uses_visible_text() {
        let renderer = FakeRenderer::new().page(
            "https://example.com/empty",
            "<html><body><header>x</header></body></html>",
        );
        let posting = scraper(renderer).scrape("https://example.com/empty").await;

        assert_eq!(posting.extracted_text, "visible body text");
        assert_eq!(posting.extraction_status, ExtractionStatus::Fallback);
    }

    #[tokio::test]
    async fn test_blank_page_and_body_is_extraction_sentinel() {
        let mut renderer = FakeRenderer::new();
        renderer.body_text = "  \n ".into();
        let posting = scraper(renderer).scrape("https://example.com/blank").await;

        assert_eq!(posting.extracted_text, EXTRACTION_ERROR_SENTINEL);
        assert_eq!(posting.extraction_status, ExtractionStatus::Error);
    }

    #[tokio::test]
    async fn test_platform_hooks_and_release() {
        let renderer = FakeRenderer::new();
        let interactions = renderer.interactions.clone();
        let closed = renderer.closed.clone();

        let postings = scraper(renderer)
            .scrape_all(&[
                "https://www.linkedin.com/jobs/view/1".to_string(),
                "https://job-boards.greenhouse.io/x/jobs/2".to_string(),
                "https://example.com/3".to_string(),
            ])
            .await;

        assert_eq!(postings.len(), 3);
        assert_eq!(
            *interactions.lock().unwrap(),
            vec![InteractionHook::ScrollHalfPage, InteractionHook::ClickShowMore]
        );
        assert!(closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_closed_scraper_yields_sentinels() {
        let mut scraper = scraper(FakeRenderer::new().page("https://example.com/1", &job_page("Acme")));
        scraper.close().await;
        scraper.close().await;

        let posting = scraper.scrape("https://example.com/1").await;
        assert_eq!(posting.extracted_text, SCRAPE_ERROR_SENTINEL);
    }
}
