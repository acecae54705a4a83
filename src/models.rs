//! Data models for competitor tracking.
//!
//! This module contains the core data structures shared by the scraper,
//! the history store, the analysis agent and the report writer.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Findings categories requested from the model for every competitor.
pub const FINDING_CATEGORIES: [&str; 5] = [
    "pricing_changes",
    "product_launches",
    "partnerships",
    "funding",
    "positioning_changes",
];

/// A tracked organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Competitor {
    /// Unique name; also names the competitor's storage directory.
    pub name: String,
    /// Website URL that gets scraped each run.
    pub website: String,
    /// Social platform name to handle or profile URL.
    pub social_media: HashMap<String, String>,
}

/// Top-level shape of `competitors.json`.
#[derive(Debug, Deserialize)]
pub struct CompetitorList {
    #[serde(default)]
    pub competitors: Vec<Competitor>,
}

/// One dated text capture of a competitor's website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub competitor: String,
    pub date: NaiveDate,
    pub text: String,
}

impl Snapshot {
    /// Creates a snapshot for the given competitor and capture date.
    pub fn new(competitor: impl Into<String>, text: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            competitor: competitor.into(),
            date,
            text: text.into(),
        }
    }

    /// Day-granularity date string stored in document metadata.
    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Per-run analysis of a single competitor.
///
/// `findings` holds whatever category keys the model produced (or the empty
/// skeleton when its answer was not usable JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(flatten)]
    pub findings: Map<String, Value>,
    /// Free-text comparison against stored history.
    pub historical_changes: String,
}

impl AnalysisResult {
    /// The fallback used when the model's answer cannot be parsed: every
    /// category present with no findings.
    pub fn empty_skeleton(historical_changes: impl Into<String>) -> Self {
        let findings = FINDING_CATEGORIES
            .iter()
            .map(|key| (key.to_string(), Value::Array(Vec::new())))
            .collect();

        Self {
            findings,
            historical_changes: historical_changes.into(),
        }
    }

    /// Builds a result from model-provided findings.
    ///
    /// A `historical_changes` key from the model is replaced by ours.
    pub fn from_findings(mut findings: Map<String, Value>, historical_changes: impl Into<String>) -> Self {
        findings.remove("historical_changes");
        Self {
            findings,
            historical_changes: historical_changes.into(),
        }
    }
}

/// A competitor name paired with its analysis, as fed to the report prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    pub competitor: String,
    pub analysis: AnalysisResult,
}
