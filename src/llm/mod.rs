//! Language-model backends.
//!
//! The rest of the crate only sees the [`TextGenerator`] and [`Embedder`]
//! capabilities; [`OllamaClient`] is the production implementation.

pub mod ollama;

pub use ollama::{LlmSettings, OllamaClient};

use anyhow::Result;
use async_trait::async_trait;
use tracing::{error, info};

/// Produces a text completion for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Turns texts into embedding vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed a small batch and a single query to confirm the embedding endpoint works.
///
/// Returns `false` (after logging) when either call fails.
pub async fn check_embeddings(embedder: &dyn Embedder) -> bool {
    let passages = vec![
        "Testing competitor analysis embeddings".to_string(),
        "Another test passage for embeddings".to_string(),
    ];

    let batch = match embedder.embed(&passages).await {
        Ok(batch) => batch,
        Err(e) => {
            error!("Error testing embeddings: {:#}", e);
            return false;
        }
    };
    info!("Successfully generated batch embeddings: {} embeddings", batch.len());

    let query = vec!["What are the competitor's features?".to_string()];
    match embedder.embed(&query).await {
        Ok(vectors) => {
            let dims = vectors.first().map_or(0, Vec::len);
            info!("Successfully generated query embedding of length: {}", dims);
            true
        }
        Err(e) => {
            error!("Error testing embeddings: {:#}", e);
            false
        }
    }
}
