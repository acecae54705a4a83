//! RivalWatch - weekly competitive intelligence from competitor websites
//!
//! A CLI tool that scrapes tracked competitor websites, keeps a per-competitor
//! history index, and uses a local Ollama model to compare each competitor
//! with its history and write a combined report.
//!
//! Exit codes:
//!   0 - Success (or nothing to do because no competitors were loaded)
//!   1 - Runtime error (invalid arguments, config, model failure, etc.)

mod agent;
mod cli;
mod config;
mod llm;
mod models;
mod report;
mod scraper;
mod store;

use agent::CompetitiveAnalysisAgent;
use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use llm::{Embedder, LlmSettings, OllamaClient, TextGenerator};
use scraper::WebScraper;
use std::sync::Arc;
use std::time::Instant;
use store::VectorHistoryStore;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is resolved before logging so `[general] verbose` can set the level.
    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(config.general.verbose));

    info!("RivalWatch v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Config: {:?}", config);

    match run(args, config).await {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .rivalwatch.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(config::CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", config::CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE_NAME);
    println!("   Edit it to customize models, directories and index settings.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the weekly analysis. Returns the process exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let ollama = Arc::new(OllamaClient::new(LlmSettings::from(&config.model))?);

    if args.check_embeddings {
        let ok = llm::check_embeddings(ollama.as_ref()).await;
        return Ok(if ok { 0 } else { 1 });
    }

    let embedder: Arc<dyn Embedder> = ollama.clone();
    let generator: Arc<dyn TextGenerator> = ollama;

    let history = VectorHistoryStore::new(
        config.general.storage_dir.clone(),
        config.index.clone(),
        embedder,
        generator.clone(),
    )?;
    let scraper = WebScraper::new(&config.scraper)?;
    let agent = CompetitiveAnalysisAgent::new(scraper, Arc::new(history), generator)
        .with_progress(!args.quiet);

    let competitors = agent.load_competitors(&config.general.competitors_file);
    if competitors.is_empty() {
        error!(
            "No competitors loaded. Please check your {} file.",
            config.general.competitors_file.display()
        );
        return Ok(0);
    }

    println!("🔎 Tracking {} competitors", competitors.len());
    println!("   Model: {}", config.model.name);
    println!("   Embeddings: {}", config.model.embed_model);
    println!("   Ollama: {}", config.model.ollama_url);
    println!("   History: {}", config.general.storage_dir.display());

    let report_text = agent.generate_weekly_report(&competitors).await?;
    let saved_path = agent.save_report(&report_text, &config.general.reports_dir)?;

    info!(
        "Weekly competitive analysis completed in {:.1}s. Report saved to: {}",
        start_time.elapsed().as_secs_f64(),
        saved_path.display()
    );
    println!("\n✅ Report saved to: {}", saved_path.display());

    Ok(0)
}

/// Load the config file, apply CLI overrides and check the result.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = load_config(args)?;
    config.merge_with_args(args);
    config.validate()?;
    Ok(config)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go to stderr.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load config, using defaults: {:#}", e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::ffi::OsString;
    use tempfile::TempDir;

    #[tokio::test]
    async fn empty_competitor_list_writes_no_report() {
        let tmp = TempDir::new().unwrap();
        let competitors = tmp.path().join("competitors.json");
        std::fs::write(&competitors, r#"{"competitors": []}"#).unwrap();
        let reports = tmp.path().join("reports");

        let args = Args::parse_from([
            OsString::from("rivalwatch"),
            OsString::from("--competitors"),
            competitors.into_os_string(),
            OsString::from("--storage-dir"),
            tmp.path().join("competitor_data").into_os_string(),
            OsString::from("--output-dir"),
            reports.clone().into_os_string(),
            OsString::from("--ollama-url"),
            OsString::from("http://127.0.0.1:9"),
        ]);

        let config = resolve_config(&args).unwrap();
        let exit_code = run(args, config).await.unwrap();

        assert_eq!(exit_code, 0);
        assert!(!reports.exists());
    }

    #[test]
    fn chunk_size_not_above_overlap_is_a_config_error() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("rivalwatch.toml");
        std::fs::write(&config_path, "[index]\nchunk_overlap = 20\n").unwrap();

        let args = Args::parse_from([
            OsString::from("rivalwatch"),
            OsString::from("--config"),
            config_path.into_os_string(),
            OsString::from("--chunk-size"),
            OsString::from("16"),
        ]);

        let err = resolve_config(&args).unwrap_err();
        assert!(format!("{:#}", err).contains("chunk_overlap"));
    }
}
