//! Competitive analysis workflow.
//!
//! Competitors are processed strictly one after another. For each one the
//! website is scraped, the snapshot appended to its history, and two fixed
//! questions are asked against that history. The collected analyses then go
//! into a single report completion.

use crate::agent::prompts::{parse_findings, CURRENT_STATE_QUERY, HISTORICAL_QUERY};
use crate::llm::TextGenerator;
use crate::models::{AnalysisResult, Competitor, CompetitorAnalysis, CompetitorList, Snapshot};
use crate::report;
use crate::scraper::WebScraper;
use crate::store::HistoryStore;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Drives scraping, history storage, querying and report synthesis.
pub struct CompetitiveAnalysisAgent {
    scraper: WebScraper,
    history: Arc<dyn HistoryStore>,
    generator: Arc<dyn TextGenerator>,
    show_progress: bool,
}

impl CompetitiveAnalysisAgent {
    pub fn new(
        scraper: WebScraper,
        history: Arc<dyn HistoryStore>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            scraper,
            history,
            generator,
            show_progress: false,
        }
    }

    /// Show a progress bar while competitors are analyzed.
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Load the tracked competitors from a JSON file.
    ///
    /// Any read or parse failure is logged and yields an empty list.
    pub fn load_competitors(&self, path: &Path) -> Vec<Competitor> {
        match read_competitors(path) {
            Ok(competitors) => {
                info!("Loaded {} competitors from {}", competitors.len(), path.display());
                competitors
            }
            Err(e) => {
                error!("Error loading competitors: {:#}", e);
                Vec::new()
            }
        }
    }

    /// Analyze one competitor, capturing today's snapshot.
    pub async fn analyze_competitor(&self, competitor: &Competitor) -> AnalysisResult {
        self.analyze_competitor_on(competitor, chrono::Local::now().date_naive())
            .await
    }

    /// Analyze one competitor, recording the snapshot under `date`.
    pub async fn analyze_competitor_on(
        &self,
        competitor: &Competitor,
        date: NaiveDate,
    ) -> AnalysisResult {
        info!("Analyzing {} ({})", competitor.name, competitor.website);

        let content = self.scraper.scrape(&competitor.website).await;
        if content.is_empty() {
            warn!("No content scraped for {}", competitor.name);
        }

        let snapshot = Snapshot::new(competitor.name.clone(), content, date);
        self.history.store(&snapshot).await;

        let historical = self.history.query(&competitor.name, HISTORICAL_QUERY).await;
        let current = self.history.query(&competitor.name, CURRENT_STATE_QUERY).await;

        match parse_findings(&current) {
            Some(findings) => AnalysisResult::from_findings(findings, historical),
            None => {
                debug!(
                    "Current-state answer for {} is not a JSON object; using empty findings",
                    competitor.name
                );
                AnalysisResult::empty_skeleton(historical)
            }
        }
    }

    /// Analyze every competitor in order and ask the model for the report.
    ///
    /// The model's text is returned verbatim.
    pub async fn generate_weekly_report(&self, competitors: &[Competitor]) -> Result<String> {
        let progress = self.progress_bar(competitors.len());

        let mut analyses = Vec::with_capacity(competitors.len());
        for competitor in competitors {
            progress.set_message(competitor.name.clone());
            let analysis = self.analyze_competitor(competitor).await;
            analyses.push(CompetitorAnalysis {
                competitor: competitor.name.clone(),
                analysis,
            });
            progress.inc(1);
        }
        progress.finish_and_clear();

        let prompt = report::build_report_prompt(&analyses)?;
        info!("Requesting report for {} competitors", analyses.len());

        self.generator
            .complete(&prompt)
            .await
            .context("Failed to generate report")
    }

    /// Write the report into `output_dir`; returns the file path.
    pub fn save_report(&self, report_text: &str, output_dir: &Path) -> Result<PathBuf> {
        report::save_report(report_text, output_dir)
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb
    }
}

fn read_competitors(path: &Path) -> Result<Vec<Competitor>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let list: CompetitorList = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    // History directories are keyed by name, and some filesystems ignore case.
    let mut seen = HashSet::new();
    for competitor in &list.competitors {
        if !seen.insert(competitor.name.to_lowercase()) {
            anyhow::bail!(
                "Duplicate competitor name in {}: {}",
                path.display(),
                competitor.name
            );
        }
    }
    Ok(list.competitors)
}
