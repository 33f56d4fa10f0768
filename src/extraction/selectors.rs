// src/extraction/selectors.rs
use scraper::Selector;
use tracing::warn;

use crate::utils::host_of;

/// Job boards with dedicated description selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Platform {
    LinkedIn,
    Greenhouse,
    ClimateBase,
    Ashby,
    Other,
}

impl Platform {
    pub const KNOWN: [Platform; 4] = [
        Platform::LinkedIn,
        Platform::Greenhouse,
        Platform::ClimateBase,
        Platform::Ashby,
    ];

    pub fn domain(&self) -> Option<&'static str> {
        match self {
            Platform::LinkedIn => Some("linkedin.com"),
            Platform::Greenhouse => Some("greenhouse.io"),
            Platform::ClimateBase => Some("climatebase.org"),
            Platform::Ashby => Some("ashbyhq.com"),
            Platform::Other => None,
        }
    }

    pub fn from_url(url: &str) -> Self {
        let host = host_of(url);
        Self::KNOWN
            .into_iter()
            .find(|p| p.domain().is_some_and(|d| host.contains(d)))
            .unwrap_or(Platform::Other)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::Greenhouse => "Greenhouse",
            Platform::ClimateBase => "ClimateBase",
            Platform::Ashby => "Ashby",
            Platform::Other => "Other",
        }
    }

    fn description_selectors(&self) -> &'static [&'static str] {
        match self {
            Platform::LinkedIn => &[
                ".jobs-description-content__text",
                ".description__text",
                ".jobs-box__html-content",
                "[data-job-description-content]",
            ],
            Platform::Greenhouse => &[
                ".greenhouse-job-description",
                ".job-description",
                "#job_description",
                ".field-group-format-wrapper",
            ],
            Platform::ClimateBase => &[
                ".job-details",
                ".job-description",
                "[data-testid='job-description']",
            ],
            Platform::Ashby => &[
                ".job-description-section",
                ".job-description",
                "[data-testid='job-description']",
            ],
            Platform::Other => &[],
        }
    }
}

const GENERIC_SELECTORS: [&str; 7] = [
    "#job-description",
    ".job-description",
    "[data-testid='job-description']",
    "main",
    "article",
    "div[class*='content']",
    "div[class*='description']",
];

/// Subtrees never considered part of a job description
pub const EXCLUDED_TAGS: [&str; 5] = ["script", "style", "nav", "footer", "header"];

pub fn is_excluded_tag(name: &str) -> bool {
    EXCLUDED_TAGS.contains(&name)
}

/// A CSS selector kept alongside its source text for logging
#[derive(Debug, Clone)]
pub struct NamedSelector {
    pub source: String,
    pub selector: Selector,
}

/// Ordered selector groups: one per known platform, then the generic fallbacks.
#[derive(Debug, Clone)]
pub struct SelectorSet {
    platforms: Vec<(Platform, Vec<NamedSelector>)>,
    generic: Vec<NamedSelector>,
}

impl Default for SelectorSet {
    fn default() -> Self {
        let platforms = Platform::KNOWN
            .into_iter()
            .map(|p| (p, compile(p.description_selectors().iter().copied())))
            .collect();
        Self {
            platforms,
            generic: compile(GENERIC_SELECTORS.iter().copied()),
        }
    }
}

impl SelectorSet {
    /// Replace the selectors of one platform
    pub fn with_platform<'a>(
        mut self,
        platform: Platform,
        selectors: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let compiled = compile(selectors);
        match self.platforms.iter_mut().find(|(p, _)| *p == platform) {
            Some((_, existing)) => *existing = compiled,
            None => self.platforms.push((platform, compiled)),
        }
        self
    }

    pub fn with_generic<'a>(mut self, selectors: impl IntoIterator<Item = &'a str>) -> Self {
        self.generic = compile(selectors);
        self
    }

    /// Selectors to try for `url`, platform-specific ones first
    pub fn chain_for(&self, url: &str) -> Vec<&NamedSelector> {
        let platform = Platform::from_url(url);
        self.platforms
            .iter()
            .filter(|(p, _)| *p == platform)
            .flat_map(|(_, selectors)| selectors.iter())
            .chain(self.generic.iter())
            .collect()
    }
}

fn compile<'a>(sources: impl IntoIterator<Item = &'a str>) -> Vec<NamedSelector> {
    sources
        .into_iter()
        .filter_map(|source| match Selector::parse(source) {
            Ok(selector) => Some(NamedSelector {
                source: source.to_string(),
                selector,
            }),
            Err(e) => {
                warn!("Skipping invalid selector {:?}: {}", source, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtin_selectors_compile() {
        let set = SelectorSet::default();
        assert_eq!(set.generic.len(), GENERIC_SELECTORS.len());
        for (platform, selectors) in &set.platforms {
            assert_eq!(selectors.len(), platform.description_selectors().len());
        }
    }

    #[test]
    fn test_platform_from_url() {
        assert_eq!(
            Platform::from_url("https://www.linkedin.com/jobs/view/4157798987"),
            Platform::LinkedIn
        );
        assert_eq!(
            Platform::from_url("https://job-boards.greenhouse.io/render/jobs/4417630005"),
            Platform::Greenhouse
        );
        assert_eq!(
            Platform::from_url("https://jobs.ashbyhq.com/DeepL/47ef3c02"),
            Platform::Ashby
        );
        assert_eq!(Platform::from_url("https://example.com/jobs/1"), Platform::Other);
    }

    #[test]
    fn test_platform_matches_host_not_path() {
        assert_eq!(
            Platform::from_url("https://example.com/redirect/linkedin.com"),
            Platform::Other
        );
    }

    #[test]
    fn test_chain_puts_platform_first() {
        let set = SelectorSet::default();
        let chain = set.chain_for("https://www.linkedin.com/jobs/view/1");
        assert_eq!(chain[0].source, ".jobs-description-content__text");
        assert_eq!(chain.last().unwrap().source, "div[class*='description']");

        let generic = set.chain_for("https://example.com");
        assert_eq!(generic.len(), GENERIC_SELECTORS.len());
    }

    #[test]
    fn test_invalid_override_is_skipped() {
        let set = SelectorSet::default().with_platform(Platform::Ashby, [".ok", "[[bad"]);
        let chain = set.chain_for("https://jobs.ashbyhq.com/x");
        assert_eq!(chain[0].source, ".ok");
        assert_eq!(chain.len(), 1 + GENERIC_SELECTORS.len());
    }
}
