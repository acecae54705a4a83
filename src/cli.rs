//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Options left unset fall back to the
//! configuration file and then to built-in defaults.

use clap::Parser;
use std::path::PathBuf;

/// RivalWatch - weekly competitor intelligence from websites and local AI
///
/// Scrapes each tracked competitor's website, appends the text to that
/// competitor's history index, compares it with earlier snapshots and asks
/// a local Ollama model to write a combined report.
///
/// Examples:
///   rivalwatch
///   rivalwatch --competitors tracked.json --output-dir weekly
///   rivalwatch --model llama3.2:latest --embed-model nomic-embed-text
///   rivalwatch --check-embeddings
///   rivalwatch --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// JSON file listing the competitors to track
    ///
    /// Default: competitors.json (or [general].competitors_file)
    #[arg(short = 'C', long, value_name = "FILE")]
    pub competitors: Option<PathBuf>,

    /// Directory holding per-competitor history indexes
    #[arg(long, value_name = "DIR")]
    pub storage_dir: Option<PathBuf>,

    /// Directory the report is written to
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Ollama chat model used for answers and the report
    #[arg(short, long, value_name = "NAME", env = "RIVALWATCH_MODEL")]
    pub model: Option<String>,

    /// Ollama model used for embeddings
    #[arg(long, value_name = "NAME", env = "RIVALWATCH_EMBED_MODEL")]
    pub embed_model: Option<String>,

    /// Ollama API endpoint URL
    #[arg(long, value_name = "URL", env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .rivalwatch.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Model request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Tokens per history chunk
    #[arg(long, value_name = "TOKENS")]
    pub chunk_size: Option<usize>,

    /// Number of history chunks retrieved per question
    #[arg(long, value_name = "COUNT")]
    pub top_k: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verify the embedding endpoint and exit
    #[arg(long)]
    pub check_embeddings: bool,

    /// Generate a default .rivalwatch.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if self.chunk_size == Some(0) {
            return Err("Chunk size must be at least 1".to_string());
        }

        if self.top_k == Some(0) {
            return Err("Top-k must be at least 1".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose` from the config file;
    /// `--quiet` still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
