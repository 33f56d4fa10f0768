// src/records.rs
//! CSV tables read and written by the command line
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

use crate::types::{CoverLetterRecord, JobPosting, ERROR_PREFIX};
use crate::utils::{char_len, read_file_content, write_file_content};

pub const JOB_LINK_COLUMN: &str = "job_link";

/// One row of the generated output table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverLetterRow {
    pub job_link: String,
    #[serde(default)]
    pub job_content: String,
    #[serde(default)]
    pub cover_letter: String,
}

impl From<&CoverLetterRecord> for CoverLetterRow {
    fn from(record: &CoverLetterRecord) -> Self {
        Self {
            job_link: record.job_url.clone(),
            job_content: record.job_content.clone(),
            cover_letter: record.cover_letter.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ScrapeRow<'a> {
    job_link: &'a str,
    job_content: &'a str,
    content_length: usize,
}

#[derive(Debug, Serialize)]
struct JobLinkRow<'a> {
    job_link: &'a str,
}

/// Read the `job_link` column, skipping blank cells. Other columns are ignored.
pub async fn read_job_links(path: &Path) -> Result<Vec<String>> {
    let content = read_file_content(path).await?;
    let links = parse_job_links(&content)
        .with_context(|| format!("Invalid job table: {}", path.display()))?;
    info!("Loaded {} job links from {}", links.len(), path.display());
    Ok(links)
}

fn parse_job_links(content: &str) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let column = reader
        .headers()?
        .iter()
        .position(|h| h.trim() == JOB_LINK_COLUMN);
    let Some(column) = column else {
        bail!("Missing '{}' column", JOB_LINK_COLUMN);
    };

    let mut links = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV parsing error on row {}", line + 1))?;
        match record.get(column).map(str::trim) {
            Some(link) if !link.is_empty() => links.push(link.to_string()),
            _ => warn!("Skipping row {} without a job link", line + 1),
        }
    }
    Ok(links)
}

pub async fn write_cover_letters(path: &Path, records: &[CoverLetterRecord]) -> Result<()> {
    let rows = records.iter().map(CoverLetterRow::from);
    write_rows(path, rows).await?;
    info!("Results saved to {}", path.display());
    Ok(())
}

pub async fn read_cover_letters(path: &Path) -> Result<Vec<CoverLetterRow>> {
    let content = read_file_content(path).await?;
    let mut reader = csv::Reader::from_reader(content.as_bytes());
    reader
        .deserialize()
        .collect::<Result<Vec<CoverLetterRow>, _>>()
        .with_context(|| format!("Invalid cover letter table: {}", path.display()))
}

pub async fn write_job_links(path: &Path, links: &[String]) -> Result<()> {
    let rows = links.iter().map(|link| JobLinkRow { job_link: link });
    write_rows(path, rows).await
}

/// Write `job_link, job_content, content_length` and return length statistics
pub async fn write_scrape_results(path: &Path, postings: &[JobPosting]) -> Result<ScrapeStats> {
    let rows = postings.iter().map(|p| ScrapeRow {
        job_link: &p.url,
        job_content: &p.extracted_text,
        content_length: char_len(&p.extracted_text),
    });
    write_rows(path, rows).await?;
    info!("Scraping results saved to {}", path.display());

    Ok(ScrapeStats::from_lengths(
        postings.iter().map(|p| char_len(&p.extracted_text)),
    ))
}

async fn write_rows<T: Serialize>(path: &Path, rows: impl IntoIterator<Item = T>) -> Result<()> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    let content = String::from_utf8(bytes).context("CSV output is not UTF-8")?;
    write_file_content(path, &content).await
}

/// Content length statistics of a scrape-only run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScrapeStats {
    pub total: usize,
    pub average: f64,
    pub min: usize,
    pub max: usize,
}

impl ScrapeStats {
    pub fn from_lengths(lengths: impl IntoIterator<Item = usize>) -> Self {
        let lengths: Vec<usize> = lengths.into_iter().collect();
        if lengths.is_empty() {
            return Self::default();
        }
        let sum: usize = lengths.iter().sum();
        Self {
            total: lengths.len(),
            average: sum as f64 / lengths.len() as f64,
            min: lengths.iter().copied().min().unwrap_or(0),
            max: lengths.iter().copied().max().unwrap_or(0),
        }
    }

    pub fn log_summary(&self) {
        info!("Scraping Summary:");
        info!("  Total URLs processed: {}", self.total);
        info!("  Average content length: {:.2}", self.average);
        info!("  Min content length: {}", self.min);
        info!("  Max content length: {}", self.max);
    }
}

/// Success rate of a previously written output table.
///
/// A row counts as failed when its letter mentions the error prefix anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultAnalysis {
    pub total: usize,
    pub successful: usize,
    pub failed_links: Vec<String>,
}

impl ResultAnalysis {
    pub fn from_rows(rows: &[CoverLetterRow]) -> Self {
        let failed_links: Vec<String> = rows
            .iter()
            .filter(|row| row.cover_letter.contains(ERROR_PREFIX))
            .map(|row| row.job_link.clone())
            .collect();
        Self {
            total: rows.len(),
            successful: rows.len() - failed_links.len(),
            failed_links,
        }
    }

    /// Percentage in `[0, 100]`; zero for an empty table
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.successful as f64 / self.total as f64 * 100.0
    }

    pub fn log_summary(&self) {
        info!("Results Analysis:");
        info!("  Total jobs processed: {}", self.total);
        info!("  Successful cover letters: {}", self.successful);
        info!("  Success rate: {:.1}%", self.success_rate());
        if !self.failed_links.is_empty() {
            warn!("Error Details:");
            for link in &self.failed_links {
                warn!("  Error in job: {}", link);
            }
        }
    }
}
