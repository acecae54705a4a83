//! Persisted per-competitor vector index.
//!
//! An index lives in one directory as `index.json`. It records every
//! inserted document and the embedded chunks ("nodes") cut from it. Nodes
//! are only ever appended.

use crate::config::IndexConfig;
use crate::llm::Embedder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File name of the persisted index inside a competitor directory.
pub const INDEX_FILE_NAME: &str = "index.json";

const INDEX_VERSION: u32 = 1;

/// Errors raised while loading, growing or persisting an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// No index has been persisted in the directory yet.
    #[error("no index found at {0}")]
    Missing(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The index file exists but cannot be decoded.
    #[error("index at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("index at {path} has unsupported version {version}")]
    UnsupportedVersion { path: PathBuf, version: u32 },

    #[error("embedding failed: {0:#}")]
    Embedding(anyhow::Error),
}

/// A unit of text plus metadata to be inserted into an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(text: impl Into<String>, metadata: BTreeMap<String, String>) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// Bookkeeping record for an inserted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub metadata: BTreeMap<String, String>,
    pub node_ids: Vec<String>,
}

/// An embedded chunk of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub doc_id: String,
    pub text: String,
    pub metadata: BTreeMap<String, String>,
    pub embedding: Vec<f32>,
}

impl Node {
    /// Node text prefixed with its metadata, as shown to the model.
    pub fn content_with_metadata(&self) -> String {
        let mut content = String::new();
        for (key, value) in &self.metadata {
            content.push_str(&format!("{}: {}\n", key, value));
        }
        if !self.metadata.is_empty() {
            content.push('\n');
        }
        content.push_str(&self.text);
        content
    }
}

/// Append-only vector index over a competitor's snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    version: u32,
    documents: Vec<StoredDocument>,
    nodes: Vec<Node>,
}

impl Default for VectorIndex {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            documents: Vec::new(),
            nodes: Vec::new(),
        }
    }
}

impl VectorIndex {
    /// Path of the index file inside `dir`.
    pub fn file_path(dir: &Path) -> PathBuf {
        dir.join(INDEX_FILE_NAME)
    }

    /// Load the index persisted in `dir`.
    pub fn load(dir: &Path) -> Result<Self, IndexError> {
        let path = Self::file_path(dir);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(IndexError::Missing(path)),
            Err(source) => return Err(IndexError::Io { path, source }),
        };

        let index: VectorIndex = serde_json::from_str(&content)
            .map_err(|source| IndexError::Corrupt {
                path: path.clone(),
                source,
            })?;

        if index.version != INDEX_VERSION {
            return Err(IndexError::UnsupportedVersion {
                path,
                version: index.version,
            });
        }

        debug!(
            "Loaded index from {} ({} documents, {} nodes)",
            path.display(),
            index.documents.len(),
            index.nodes.len()
        );
        Ok(index)
    }

    /// Write the index to `dir`, replacing the previous file atomically.
    pub fn persist(&self, dir: &Path) -> Result<(), IndexError> {
        let path = Self::file_path(dir);
        let tmp_path = dir.join(format!("{}.tmp", INDEX_FILE_NAME));

        let content = serde_json::to_string(self).map_err(|source| IndexError::Corrupt {
            path: path.clone(),
            source,
        })?;

        std::fs::write(&tmp_path, content).map_err(|source| IndexError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        std::fs::rename(&tmp_path, &path).map_err(|source| IndexError::Io {
            path: path.clone(),
            source,
        })?;

        Ok(())
    }

    /// Chunk, embed and append a document.
    pub async fn insert(
        &mut self,
        document: Document,
        embedder: &dyn Embedder,
        config: &IndexConfig,
    ) -> Result<(), IndexError> {
        let doc_id = format!("doc-{:05}", self.documents.len() + 1);
        let chunks = chunk_text(&document.text, config.chunk_size, config.chunk_overlap);

        let embeddings = if chunks.is_empty() {
            Vec::new()
        } else {
            embedder
                .embed(&chunks)
                .await
                .map_err(IndexError::Embedding)?
        };
        if embeddings.len() != chunks.len() {
            return Err(IndexError::Embedding(anyhow::anyhow!(
                "expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut node_ids = Vec::with_capacity(chunks.len());
        for (i, (text, embedding)) in chunks.into_iter().zip(embeddings).enumerate() {
            let id = format!("{}-{}", doc_id, i);
            node_ids.push(id.clone());
            self.nodes.push(Node {
                id,
                doc_id: doc_id.clone(),
                text,
                metadata: document.metadata.clone(),
                embedding,
            });
        }

        debug!("Inserted {} with {} chunks", doc_id, node_ids.len());
        self.documents.push(StoredDocument {
            id: doc_id,
            metadata: document.metadata,
            node_ids,
        });

        Ok(())
    }

    /// The `top_k` nodes most similar to `query`, best first.
    pub fn retrieve(&self, query: &[f32], top_k: usize) -> Vec<&Node> {
        let mut scored: Vec<(f32, &Node)> = self
            .nodes
            .iter()
            .map(|node| (cosine_similarity(query, &node.embedding), node))
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().take(top_k).map(|(_, node)| node).collect()
    }

    pub fn documents(&self) -> &[StoredDocument] {
        &self.documents
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// Split text into overlapping windows of whitespace-separated tokens.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Vec::new();
    }

    let chunk_size = chunk_size.max(1);
    let step = chunk_size.saturating_sub(overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + chunk_size).min(tokens.len());
        chunks.push(tokens[start..end].join(" "));
        if end == tokens.len() {
            break;
        }
        start += step;
    }
    chunks
}

/// Cosine similarity; zero when either vector is zero or lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use tempfile::TempDir;

    /// Embeds by counting a couple of marker words.
    struct WordCountEmbedder;

    #[async_trait]
    impl Embedder for WordCountEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    vec![
                        t.matches("price").count() as f32,
                        t.matches("partner").count() as f32,
                        1.0,
                    ]
                })
                .collect())
        }
    }

    fn metadata(date: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("competitor".to_string(), "Acme".to_string()),
            ("date".to_string(), date.to_string()),
        ])
    }

    #[test]
    fn chunk_text_windows_with_overlap() {
        let text = "a b c d e f g";
        assert_eq!(chunk_text(text, 3, 1), vec!["a b c", "c d e", "e f g"]);
        assert_eq!(chunk_text(text, 10, 2), vec!["a b c d e f g"]);
        assert!(chunk_text("   ", 3, 1).is_empty());
    }

    #[test]
    fn chunk_text_overlap_not_smaller_than_size_still_advances() {
        assert_eq!(chunk_text("a b c", 2, 5), vec!["a b", "b c"]);
    }

    #[test]
    fn cosine_similarity_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 1.0]), 0.0);
    }

    #[tokio::test]
    async fn insert_persist_and_reload() {
        let dir = TempDir::new().unwrap();
        let config = IndexConfig::default();

        let mut index = VectorIndex::default();
        index
            .insert(
                Document::new("price cut on widgets", metadata("2024-05-01")),
                &WordCountEmbedder,
                &config,
            )
            .await
            .unwrap();
        index.persist(dir.path()).unwrap();

        let reloaded = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(reloaded, index);
        assert_eq!(reloaded.documents().len(), 1);
        assert_eq!(reloaded.node_count(), 1);
        assert!(!dir.path().join("index.json.tmp").exists());
    }

    #[tokio::test]
    async fn empty_document_is_recorded_without_nodes() {
        let mut index = VectorIndex::default();
        index
            .insert(
                Document::new("", metadata("2024-05-01")),
                &WordCountEmbedder,
                &IndexConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(index.documents().len(), 1);
        assert!(index.documents()[0].node_ids.is_empty());
        assert_eq!(index.node_count(), 0);
    }

    #[tokio::test]
    async fn retrieve_ranks_by_similarity() {
        let mut index = VectorIndex::default();
        let config = IndexConfig::default();
        for text in ["new partner program", "price price increase"] {
            index
                .insert(Document::new(text, metadata("2024-05-01")), &WordCountEmbedder, &config)
                .await
                .unwrap();
        }

        let hits = index.retrieve(&[1.0, 0.0, 0.0], 1);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].text, "price price increase");
    }

    #[test]
    fn load_distinguishes_missing_from_corrupt() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(VectorIndex::load(dir.path()), Err(IndexError::Missing(_))));

        std::fs::write(dir.path().join(INDEX_FILE_NAME), "{ not json").unwrap();
        assert!(matches!(VectorIndex::load(dir.path()), Err(IndexError::Corrupt { .. })));
    }

    #[test]
    fn load_rejects_unknown_version() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(INDEX_FILE_NAME),
            r#"{"version": 99, "documents": [], "nodes": []}"#,
        )
        .unwrap();
        assert!(matches!(
            VectorIndex::load(dir.path()),
            Err(IndexError::UnsupportedVersion { version: 99, .. })
        ));
    }

    #[test]
    fn content_with_metadata_prefixes_fields() {
        let node = Node {
            id: "doc-00001-0".into(),
            doc_id: "doc-00001".into(),
            text: "body".into(),
            metadata: metadata("2024-05-01"),
            embedding: vec![],
        };
        assert_eq!(
            node.content_with_metadata(),
            "competitor: Acme\ndate: 2024-05-01\n\nbody"
        );
    }
}
