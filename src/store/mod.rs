//! Per-competitor snapshot history.
//!
//! Each competitor gets its own directory under the storage root holding a
//! [`VectorIndex`]. Questions are answered by retrieving the most similar
//! snapshot chunks and handing them to the text generator.

pub mod index;

pub use index::{Document, IndexError, VectorIndex};

use crate::config::IndexConfig;
use crate::llm::{Embedder, TextGenerator};
use crate::models::Snapshot;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Persistent, queryable history of competitor snapshots.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append a snapshot to the competitor's history.
    ///
    /// Returns `false` (after logging) if the snapshot could not be stored.
    async fn store(&self, snapshot: &Snapshot) -> bool;

    /// Answer `question` from the competitor's history.
    ///
    /// Returns an empty string when there is no history or the query fails.
    async fn query(&self, competitor: &str, question: &str) -> String;
}

/// [`HistoryStore`] backed by one vector index directory per competitor.
pub struct VectorHistoryStore {
    storage_dir: PathBuf,
    config: IndexConfig,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn TextGenerator>,
}

impl VectorHistoryStore {
    /// Create a store rooted at `storage_dir`, creating the directory if needed.
    pub fn new(
        storage_dir: impl Into<PathBuf>,
        config: IndexConfig,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self> {
        let storage_dir = storage_dir.into();
        std::fs::create_dir_all(&storage_dir).with_context(|| {
            format!("Failed to create storage directory: {}", storage_dir.display())
        })?;

        Ok(Self {
            storage_dir,
            config,
            embedder,
            generator,
        })
    }

    /// Directory holding `competitor`'s index, or `None` for an empty name.
    pub fn competitor_dir(&self, competitor: &str) -> Option<PathBuf> {
        if competitor.is_empty() {
            return None;
        }
        Some(self.storage_dir.join(dir_name_for(competitor)))
    }

    async fn try_store(&self, snapshot: &Snapshot) -> Result<()> {
        let dir = self
            .competitor_dir(&snapshot.competitor)
            .context("Competitor name is empty")?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let mut index = match VectorIndex::load(&dir) {
            Ok(index) => index,
            Err(IndexError::Missing(_)) => {
                debug!("Creating new index for {}", snapshot.competitor);
                VectorIndex::default()
            }
            // Existing history is never replaced by a fresh index.
            Err(e) => return Err(e).context("Refusing to overwrite unreadable index"),
        };

        let metadata = BTreeMap::from([
            ("competitor".to_string(), snapshot.competitor.clone()),
            ("date".to_string(), snapshot.date_label()),
        ]);
        index
            .insert(Document::new(snapshot.text.clone(), metadata), self.embedder.as_ref(), &self.config)
            .await?;
        index.persist(&dir)?;

        debug!(
            "History for {} now holds {} snapshots",
            snapshot.competitor,
            index.documents().len()
        );
        Ok(())
    }

    async fn try_query(&self, dir: &Path, question: &str) -> Result<String> {
        let index = VectorIndex::load(dir)?;
        if index.node_count() == 0 {
            debug!("Index at {} has no content to query", dir.display());
            return Ok(String::new());
        }

        let query_embedding = self
            .embedder
            .embed(&[question.to_string()])
            .await?
            .into_iter()
            .next()
            .context("Embedder returned no vector for the question")?;

        let context = index
            .retrieve(&query_embedding, self.config.similarity_top_k)
            .into_iter()
            .map(|node| node.content_with_metadata())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = build_qa_prompt(&context, question);
        self.generator.complete(&prompt).await
    }
}

#[async_trait]
impl HistoryStore for VectorHistoryStore {
    async fn store(&self, snapshot: &Snapshot) -> bool {
        match self.try_store(snapshot).await {
            Ok(()) => {
                info!("Stored data for {}", snapshot.competitor);
                true
            }
            Err(e) => {
                error!("Error storing competitor data for {}: {:#}", snapshot.competitor, e);
                false
            }
        }
    }

    async fn query(&self, competitor: &str, question: &str) -> String {
        let Some(dir) = self.competitor_dir(competitor) else {
            return String::new();
        };
        if !dir.exists() {
            debug!("No history for {}", competitor);
            return String::new();
        }

        match self.try_query(&dir, question).await {
            Ok(answer) => answer,
            Err(e) => {
                error!("Error querying competitor history for {}: {:#}", competitor, e);
                String::new()
            }
        }
    }
}

/// Question-answering prompt over retrieved history.
fn build_qa_prompt(context: &str, question: &str) -> String {
    format!(
        "Context information is below.\n\
         ---------------------\n\
         {}\n\
         ---------------------\n\
         Given the context information and not prior knowledge, answer the query.\n\
         Query: {}\n\
         Answer: ",
        context, question
    )
}

/// Filesystem-safe, collision-free directory name for a competitor.
///
/// Alphanumerics, spaces, `-`, `_` and `.` pass through; anything else is
/// percent-encoded, and names made only of dots are fully encoded.
fn dir_name_for(competitor: &str) -> String {
    let all_dots = competitor.chars().all(|c| c == '.');
    let mut out = String::with_capacity(competitor.len());

    for c in competitor.chars() {
        let passthrough = c.is_alphanumeric() || matches!(c, ' ' | '-' | '_') || (c == '.' && !all_dots);
        if passthrough {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}
