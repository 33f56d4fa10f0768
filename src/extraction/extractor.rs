// src/extraction/extractor.rs
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, warn};

use super::selectors::{is_excluded_tag, SelectorSet};
use crate::config::{ExtractionConfig, ExtractionProfile};
use crate::types::{ExtractionStatus, EXTRACTION_ERROR_SENTINEL};
use crate::utils::{collapse_whitespace, truncate_chars, word_count};

/// Text produced for one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub status: ExtractionStatus,
    /// Selector that produced the text, when one did
    pub selector: Option<String>,
}

impl Extraction {
    fn failed() -> Self {
        Self {
            text: EXTRACTION_ERROR_SENTINEL.to_string(),
            status: ExtractionStatus::Error,
            selector: None,
        }
    }
}

/// Turns rendered HTML into a bounded plain-text job description.
///
/// Pure: the same HTML and URL always give the same text.
pub struct ContentExtractor {
    config: ExtractionConfig,
    selectors: SelectorSet,
    fragment_selector: Option<Selector>,
    broad_selector: Option<Selector>,
}

impl ContentExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            selectors: SelectorSet::default(),
            fragment_selector: Selector::parse("p, li").ok(),
            broad_selector: Selector::parse("p, div, span, li").ok(),
        }
    }

    pub fn with_selectors(mut self, selectors: SelectorSet) -> Self {
        self.selectors = selectors;
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extracted text only; failures come back as the extraction-error sentinel
    pub fn extract(&self, html: &str, url: &str) -> String {
        self.extract_detailed(html, url).text
    }

    pub fn extract_detailed(&self, html: &str, url: &str) -> Extraction {
        if html.trim().is_empty() {
            warn!("Empty HTML for {}", url);
            return Extraction::failed();
        }

        let document = Html::parse_document(html);
        if !document.errors.is_empty() {
            debug!("{} HTML parse issues for {}", document.errors.len(), url);
        }

        let found = match self.config.profile {
            ExtractionProfile::Precise => self.extract_by_selectors(&document, url),
            ExtractionProfile::Broad => self.extract_broad(&document),
        };
        if let Some(extraction) = found {
            return extraction;
        }

        warn!("No selector matched for {}, falling back to page text", url);
        let page_text = collapse_whitespace(&visible_text(document.root_element()));
        if page_text.is_empty() {
            warn!("Page text is empty for {}", url);
            return Extraction::failed();
        }

        Extraction {
            text: truncate_chars(&page_text, self.config.fallback_max_chars),
            status: ExtractionStatus::Fallback,
            selector: None,
        }
    }

    fn extract_by_selectors(&self, document: &Html, url: &str) -> Option<Extraction> {
        let fragment_selector = self.fragment_selector.as_ref()?;

        for named in self.selectors.chain_for(url) {
            let elements: Vec<ElementRef> = document
                .select(&named.selector)
                .filter(|el| !inside_excluded(*el))
                .collect();
            if elements.is_empty() {
                continue;
            }

            let fragments: Vec<String> = elements
                .iter()
                .flat_map(|el| self.substantive_fragments(*el, fragment_selector))
                .collect();
            if fragments.is_empty() {
                debug!("Selector {} matched without substantive text", named.source);
                continue;
            }

            info!("Content extracted using selector: {}", named.source);
            let text = collapse_whitespace(&fragments.join(" "));
            return Some(Extraction {
                text: truncate_chars(&text, self.config.max_chars),
                status: ExtractionStatus::Ok,
                selector: Some(named.source.clone()),
            });
        }
        None
    }

    /// Paragraph and list-item texts of `element` above the word threshold,
    /// optionally limited to the `top_k` longest (document order kept).
    fn substantive_fragments(&self, element: ElementRef, fragment_selector: &Selector) -> Vec<String> {
        let mut candidates: Vec<(usize, usize, String)> = element
            .select(fragment_selector)
            .filter(|el| !inside_excluded(*el))
            .map(|el| collapse_whitespace(&visible_text(el)))
            .filter(|text| word_count(text) > self.config.min_words)
            .enumerate()
            .map(|(position, text)| (position, word_count(&text), text))
            .collect();

        if let Some(k) = self.config.top_k {
            candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
            candidates.truncate(k);
            candidates.sort_by_key(|c| c.0);
        }

        candidates.into_iter().map(|(_, _, text)| text).collect()
    }

    fn extract_broad(&self, document: &Html) -> Option<Extraction> {
        let selector = self.broad_selector.as_ref()?;
        let parts: Vec<String> = document
            .select(selector)
            .filter(|el| !inside_excluded(*el))
            .map(|el| collapse_whitespace(&visible_text(el)))
            .filter(|text| !text.is_empty())
            .collect();
        if parts.is_empty() {
            return None;
        }

        Some(Extraction {
            text: truncate_chars(&parts.join(" "), self.config.max_chars),
            status: ExtractionStatus::Ok,
            selector: None,
        })
    }
}

/// Concatenated text of `element`, skipping script/style/nav/footer/header subtrees
pub fn visible_text(element: ElementRef) -> String {
    let mut parts = Vec::new();
    push_visible_text(element, &mut parts);
    parts.join(" ")
}

fn push_visible_text(element: ElementRef, parts: &mut Vec<String>) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let text: &str = text;
            parts.push(text.to_string());
        } else if let Some(child_element) = ElementRef::wrap(child) {
            if !is_excluded_tag(child_element.value().name()) {
                push_visible_text(child_element, parts);
            }
        }
    }
}

fn inside_excluded(element: ElementRef) -> bool {
    is_excluded_tag(element.value().name())
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| is_excluded_tag(a.value().name()))
}
