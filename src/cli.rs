// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::extraction::ContentExtractor;
use crate::generation::{GenerationClient, OpenAiClient};
use crate::links::{JobLinks, LinkSummary};
use crate::orchestrator::BatchOrchestrator;
use crate::records::{self, ResultAnalysis};
use crate::renderer::{self, Renderer};
use crate::resume::ResumeContextBuilder;
use crate::scraper::JobScraper;
use crate::utils::read_file_content;

#[derive(Parser)]
#[command(name = "cover-letters")]
#[command(about = "Generate tailored cover letters for batches of job postings")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Pipeline configuration (YAML). Defaults to $COVER_LETTER_CONFIG or ./config.yaml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write JSON logs to this file (truncated on startup)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Scrape every job link and write one cover letter per posting
    Generate {
        /// CSV with a job_link column
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "cover_letters.csv")]
        output: PathBuf,
        /// Plain-text resume
        #[arg(long)]
        resume: PathBuf,
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// Scrape and extract only, reporting content lengths
    Scrape {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "job_scraping_results.csv")]
        output: PathBuf,
    },
    /// Clean a link list, group it by job board and export it
    Links {
        /// One URL per line, or a JSON summary written earlier
        #[arg(long)]
        input: PathBuf,
        /// Save a JSON summary here
        #[arg(long)]
        json: Option<PathBuf>,
        /// Write a job_link CSV usable as generate input
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, default_value_t = 3)]
        batch_size: usize,
    },
    /// Success rate and failing links of a generated table
    Report {
        #[arg(long)]
        input: PathBuf,
    },
}

pub async fn handle_command(command: Command, mut config: PipelineConfig) -> Result<()> {
    match command {
        Command::Generate {
            input,
            output,
            resume,
            batch_size,
        } => {
            if let Some(size) = batch_size {
                config.batch.batch_size = size;
                config.validate()?;
            }
            generate(&config, &input, &output, &resume).await
        }

        Command::Scrape { input, output } => scrape(&config, &input, &output).await,

        Command::Links {
            input,
            json,
            output,
            batch_size,
        } => links(&input, json.as_deref(), output.as_deref(), batch_size).await,

        Command::Report { input } => {
            let rows = records::read_cover_letters(&input).await?;
            ResultAnalysis::from_rows(&rows).log_summary();
            Ok(())
        }
    }
}

async fn generate(config: &PipelineConfig, input: &Path, output: &Path, resume: &Path) -> Result<()> {
    let job_links = records::read_job_links(input).await?;
    if job_links.is_empty() {
        warn!("⚠️  No job links in {}, nothing to do", input.display());
        return Ok(());
    }

    let resume_text = read_file_content(resume).await?;
    let resume_context = ResumeContextBuilder::new(config.resume.clone()).build(&resume_text);

    let backend = OpenAiClient::new(&config.llm)?;
    let generator = GenerationClient::new(Arc::new(backend), &config.llm);

    let scraper = job_scraper(config).await?;
    let report = BatchOrchestrator::new(config, scraper, generator, resume_context)
        .run(&job_links)
        .await;

    records::write_cover_letters(output, &report.records).await?;
    info!(
        "✅ {} of {} cover letters written to {} ({} failed batches)",
        report.success_count(),
        report.total(),
        output.display(),
        report.failed_batches
    );
    Ok(())
}

async fn scrape(config: &PipelineConfig, input: &Path, output: &Path) -> Result<()> {
    let job_links = records::read_job_links(input).await?;
    if job_links.is_empty() {
        warn!("⚠️  No job links in {}, nothing to do", input.display());
        return Ok(());
    }

    let postings = job_scraper(config).await?.scrape_all(&job_links).await;
    let stats = records::write_scrape_results(output, &postings).await?;
    stats.log_summary();
    Ok(())
}

async fn links(
    input: &Path,
    json: Option<&Path>,
    output: Option<&Path>,
    batch_size: usize,
) -> Result<()> {
    let is_json = input.extension().is_some_and(|ext| ext == "json");
    let links = if is_json {
        JobLinks::from(LinkSummary::load_json(input).await?)
    } else {
        JobLinks::load_text(input).await?
    };

    let summary = links.summary();
    summary.log_summary();

    let batches = links.batches(batch_size);
    info!("Number of batches (size {}): {}", batch_size.max(1), batches.len());
    if let Some(first) = batches.first() {
        info!("First batch of links:");
        for link in first {
            info!("  - {}", link);
        }
    }

    if let Some(path) = json {
        summary.save_json(path).await?;
    }
    if let Some(path) = output {
        records::write_job_links(path, links.links()).await?;
        info!("✅ Wrote {} links to {}", links.len(), path.display());
    }
    Ok(())
}

async fn job_scraper(config: &PipelineConfig) -> Result<JobScraper> {
    let renderer = launch_renderer(config).await?;
    Ok(JobScraper::new(
        renderer,
        ContentExtractor::new(config.extraction.clone()),
        config.batch.scrape_delay_ms,
    ))
}

/// Browser start-up blocks, so it runs off the async executor
async fn launch_renderer(config: &PipelineConfig) -> Result<Box<dyn Renderer>> {
    let renderer_config = config.renderer.clone();
    tokio::task::spawn_blocking(move || renderer::launch(&renderer_config))
        .await
        .context("Renderer start-up task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "cover-letters",
            "generate",
            "--input",
            "jobs.csv",
            "--resume",
            "resume.txt",
            "--batch-size",
            "2",
            "--config",
            "custom.yaml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
        match cli.command {
            Command::Generate {
                output, batch_size, ..
            } => {
                assert_eq!(output, PathBuf::from("cover_letters.csv"));
                assert_eq!(batch_size, Some(2));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_generate_requires_resume() {
        assert!(Cli::try_parse_from(["cover-letters", "generate", "--input", "jobs.csv"]).is_err());
    }

    #[tokio::test]
    async fn test_zero_batch_size_rejected() {
        let command = Command::Generate {
            input: PathBuf::from("missing.csv"),
            output: PathBuf::from("out.csv"),
            resume: PathBuf::from("resume.txt"),
            batch_size: Some(0),
        };
        let err = handle_command(command, PipelineConfig::default()).await.unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[tokio::test]
    async fn test_links_command_exports() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("links.txt");
        let json = dir.path().join("job_links.json");
        let output = dir.path().join("jobs.csv");
        tokio::fs::write(
            &input,
            "https://www.linkedin.com/jobs/view/1/?trk=x\nhttps://jobs.ashbyhq.com/a/b\n",
        )
        .await
        .unwrap();

        let command = Command::Links {
            input,
            json: Some(json.clone()),
            output: Some(output.clone()),
            batch_size: 3,
        };
        handle_command(command, PipelineConfig::default()).await.unwrap();

        let links = records::read_job_links(&output).await.unwrap();
        assert_eq!(
            links,
            vec!["https://www.linkedin.com/jobs/view/1", "https://jobs.ashbyhq.com/a/b"]
        );

        // a saved summary is accepted as input too
        let reloaded = JobLinks::from(LinkSummary::load_json(&json).await.unwrap());
        assert_eq!(reloaded.links(), links.as_slice());
    }

    #[tokio::test]
    async fn test_report_reads_output_table() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("letters.csv");
        tokio::fs::write(
            &input,
            "job_link,job_content,cover_letter\nu1,c,Dear team\nu2,c,Error generating cover letter\n",
        )
        .await
        .unwrap();

        handle_command(Command::Report { input }, PipelineConfig::default())
            .await
            .unwrap();
    }
}
