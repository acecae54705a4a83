//! Weekly report prompt assembly and report file output.

use crate::models::CompetitorAnalysis;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::info;

/// Build the single prompt that asks the model for the weekly report.
pub fn build_report_prompt(analyses: &[CompetitorAnalysis]) -> Result<String> {
    let data = serde_json::to_string_pretty(analyses).context("Failed to serialize analyses")?;

    let mut prompt = String::new();
    prompt.push_str("Generate a weekly competitive analysis report based on the following data:\n");
    prompt.push_str(&data);
    prompt.push_str("\n\nFormat the report with:\n");
    prompt.push_str("1. Executive Summary\n");
    prompt.push_str("2. Key Findings by Competitor\n");
    prompt.push_str("3. Market Trends\n");
    prompt.push_str("4. Historical Changes\n");
    prompt.push_str("5. Recommendations\n\n");
    prompt.push_str("Focus on significant changes and their market impact.\n");

    Ok(prompt)
}

/// File name of the report produced on `date`.
pub fn report_filename(date: NaiveDate) -> String {
    format!("competitive_analysis_report_{}.txt", date.format("%Y%m%d"))
}

/// Write `report` into `output_dir` under today's report name.
pub fn save_report(report: &str, output_dir: &Path) -> Result<PathBuf> {
    save_report_for_date(report, output_dir, chrono::Local::now().date_naive())
}

/// Write `report` into `output_dir` under the report name for `date`.
///
/// A report already written for the same date is replaced.
pub fn save_report_for_date(report: &str, output_dir: &Path, date: NaiveDate) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create reports directory: {}", output_dir.display())
    })?;

    let path = output_dir.join(report_filename(date));
    std::fs::write(&path, report)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    info!("Report saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnalysisResult;
    use tempfile::TempDir;

    #[test]
    fn test_report_filename() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        assert_eq!(report_filename(date), "competitive_analysis_report_20240109.txt");
    }

    #[test]
    fn test_build_report_prompt() {
        let analyses = vec![CompetitorAnalysis {
            competitor: "Acme".to_string(),
            analysis: AnalysisResult::empty_skeleton("Raised prices in May"),
        }];

        let prompt = build_report_prompt(&analyses).unwrap();

        assert!(prompt.starts_with("Generate a weekly competitive analysis report"));
        assert!(prompt.contains("\"competitor\": \"Acme\""));
        assert!(prompt.contains("\"pricing_changes\": []"));
        assert!(prompt.contains("Raised prices in May"));
        for section in [
            "1. Executive Summary",
            "2. Key Findings by Competitor",
            "3. Market Trends",
            "4. Historical Changes",
            "5. Recommendations",
        ] {
            assert!(prompt.contains(section), "missing {section}");
        }
    }

    #[test]
    fn test_save_report_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("nested").join("reports");
        let date = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();

        let path = save_report_for_date("REPORT-OK", &out, date).unwrap();

        assert_eq!(path, out.join("competitive_analysis_report_20240109.txt"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "REPORT-OK");
    }

    #[test]
    fn test_save_report_uses_today() {
        let tmp = TempDir::new().unwrap();
        let path = save_report("text", tmp.path()).unwrap();
        let expected = report_filename(chrono::Local::now().date_naive());
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), expected);
    }
}
