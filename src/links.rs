// src/links.rs
//! Job link lists: cleaning, grouping by board and JSON summaries
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::extraction::Platform;
use crate::utils::{read_file_content, write_file_content};

/// Drop the query string (tracking parameters) and any trailing slash
pub fn clean_url(url: &str) -> String {
    let base = url.split('?').next().unwrap_or(url);
    base.trim().trim_end_matches('/').to_string()
}

/// A cleaned, ordered list of job links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobLinks {
    links: Vec<String>,
}

impl JobLinks {
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let links: Vec<String> = raw
            .into_iter()
            .map(|url| clean_url(url.as_ref()))
            .filter(|url| !url.is_empty())
            .collect();
        info!("Cleaned {} links", links.len());
        Self { links }
    }

    /// One link per line; blank lines and `#` comments are skipped
    pub async fn load_text(path: &Path) -> Result<Self> {
        let content = read_file_content(path).await?;
        Ok(Self::from_raw(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        ))
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Links keyed by board label, each group in input order
    pub fn group_by_source(&self) -> BTreeMap<String, Vec<String>> {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for link in &self.links {
            grouped
                .entry(Platform::from_url(link).label().to_string())
                .or_default()
                .push(link.clone());
        }
        grouped
    }

    pub fn batches(&self, batch_size: usize) -> Vec<Vec<String>> {
        self.links
            .chunks(batch_size.max(1))
            .map(<[String]>::to_vec)
            .collect()
    }

    pub fn summary(&self) -> LinkSummary {
        LinkSummary {
            timestamp: Utc::now(),
            total_links: self.links.len(),
            sources: self.group_by_source(),
            links: self.links.clone(),
        }
    }
}

impl From<LinkSummary> for JobLinks {
    fn from(summary: LinkSummary) -> Self {
        Self {
            links: summary.links,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkSummary {
    pub timestamp: DateTime<Utc>,
    pub total_links: usize,
    pub sources: BTreeMap<String, Vec<String>>,
    pub links: Vec<String>,
}

impl LinkSummary {
    pub async fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize link summary")?;
        write_file_content(path, &json).await?;
        info!("Saved links to {}", path.display());
        Ok(())
    }

    pub async fn load_json(path: &Path) -> Result<Self> {
        let content = read_file_content(path).await?;
        let summary: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid link summary: {}", path.display()))?;
        info!("Loaded {} links from {}", summary.links.len(), path.display());
        Ok(summary)
    }

    pub fn log_summary(&self) {
        info!("Job Links Summary:");
        info!("  Total Links: {}", self.total_links);
        for (source, links) in &self.sources {
            info!("  {}: {} links", source, links.len());
        }
    }
}
