//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.rivalwatch.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".rivalwatch.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// History index settings.
    #[serde(default)]
    pub index: IndexConfig,

    /// Scraper settings.
    #[serde(default)]
    pub scraper: ScraperConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// JSON file listing the tracked competitors.
    #[serde(default = "default_competitors_file")]
    pub competitors_file: PathBuf,

    /// Root directory holding one index directory per competitor.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,

    /// Directory receiving the generated reports.
    #[serde(default = "default_reports_dir")]
    pub reports_dir: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            competitors_file: default_competitors_file(),
            storage_dir: default_storage_dir(),
            reports_dir: default_reports_dir(),
            verbose: false,
        }
    }
}

fn default_competitors_file() -> PathBuf {
    PathBuf::from("competitors.json")
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("competitor_data")
}

fn default_reports_dir() -> PathBuf {
    PathBuf::from("reports")
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Chat model used for answers and the report.
    #[serde(default = "default_model")]
    pub name: String,

    /// Model used to embed snapshots and questions.
    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            embed_model: default_embed_model(),
            ollama_url: default_ollama_url(),
            temperature: default_temperature(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_embed_model() -> String {
    "nomic-embed-text:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout() -> u64 {
    60
}

/// Per-competitor vector index settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Tokens per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Tokens shared between neighbouring chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks retrieved per question.
    #[serde(default = "default_top_k")]
    pub similarity_top_k: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            similarity_top_k: default_top_k(),
        }
    }
}

fn default_chunk_size() -> usize {
    512
}

fn default_chunk_overlap() -> usize {
    20
}

fn default_top_k() -> usize {
    2
}

/// Website fetching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// User-Agent header sent with every fetch.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
        }
    }
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// Only values given explicitly on the command line (or via env) override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref path) = args.competitors {
            self.general.competitors_file = path.clone();
        }
        if let Some(ref dir) = args.storage_dir {
            self.general.storage_dir = dir.clone();
        }
        if let Some(ref dir) = args.output_dir {
            self.general.reports_dir = dir.clone();
        }

        if let Some(ref model) = args.model {
            self.model.name = model.clone();
        }
        if let Some(ref model) = args.embed_model {
            self.model.embed_model = model.clone();
        }
        if let Some(ref url) = args.ollama_url {
            self.model.ollama_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        if let Some(chunk_size) = args.chunk_size {
            self.index.chunk_size = chunk_size;
        }
        if let Some(top_k) = args.top_k {
            self.index.similarity_top_k = top_k;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Check settings that are only meaningful in combination.
    ///
    /// Run after `merge_with_args`, since file and CLI values can conflict.
    pub fn validate(&self) -> Result<()> {
        let index = &self.index;
        if index.chunk_size == 0 {
            anyhow::bail!("index.chunk_size must be at least 1");
        }
        if index.chunk_overlap >= index.chunk_size {
            anyhow::bail!(
                "index.chunk_overlap ({}) must be smaller than index.chunk_size ({})",
                index.chunk_overlap,
                index.chunk_size
            );
        }
        if index.similarity_top_k == 0 {
            anyhow::bail!("index.similarity_top_k must be at least 1");
        }
        if self.model.timeout_seconds == 0 {
            anyhow::bail!("model.timeout_seconds must be at least 1");
        }
        Ok(())
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "llama3.2:latest");
        assert_eq!(config.model.ollama_url, "http://localhost:11434");
        assert_eq!(config.model.timeout_seconds, 60);
        assert_eq!(config.index.chunk_size, 512);
        assert_eq!(config.index.similarity_top_k, 2);
        assert_eq!(config.general.storage_dir, PathBuf::from("competitor_data"));
        assert_eq!(config.general.reports_dir, PathBuf::from("reports"));
        assert!(config.scraper.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
competitors_file = "tracked.json"
verbose = true

[model]
name = "mistral:7b"
timeout_seconds = 120

[index]
chunk_size = 256
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.competitors_file, PathBuf::from("tracked.json"));
        assert!(config.general.verbose);
        assert_eq!(config.general.reports_dir, PathBuf::from("reports"));
        assert_eq!(config.model.name, "mistral:7b");
        assert_eq!(config.model.timeout_seconds, 120);
        assert_eq!(config.index.chunk_size, 256);
        assert_eq!(config.index.chunk_overlap, 20);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[index]"));
        assert!(toml_str.contains("[scraper]"));

        let reparsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(reparsed.model.embed_model, Config::default().model.embed_model);
    }

    #[test]
    fn test_merge_only_overrides_given_args() {
        let mut config = Config::default();
        config.model.name = "from-file".to_string();
        config.model.timeout_seconds = 90;

        let args = crate::cli::Args::parse_from([
            "rivalwatch",
            "--output-dir",
            "out",
            "--top-k",
            "4",
        ]);
        config.merge_with_args(&args);

        assert_eq!(config.model.name, "from-file");
        assert_eq!(config.model.timeout_seconds, 90);
        assert_eq!(config.general.reports_dir, PathBuf::from("out"));
        assert_eq!(config.index.similarity_top_k, 4);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_chunk_size_not_above_overlap() {
        let mut config = Config::default();
        let args = crate::cli::Args::parse_from(["rivalwatch", "--chunk-size", "16"]);
        config.merge_with_args(&args);

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("chunk_overlap (20)"));
        assert!(err.contains("chunk_size (16)"));

        config.index.chunk_overlap = 16;
        assert!(config.validate().is_err());

        config.index.chunk_overlap = 4;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values_from_file() {
        let config: Config = toml::from_str("[index]\nsimilarity_top_k = 0\n").unwrap();
        assert!(config.validate().is_err());

        let config: Config = toml::from_str("[model]\ntimeout_seconds = 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}
