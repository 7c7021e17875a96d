//! The process-wide FAQ corpus and its vector index.
//!
//! Built once before the server starts accepting requests and shared
//! read-only afterwards. Every failure during the build degrades to a smaller
//! knowledge base instead of aborting startup.

use std::path::Path;

use crate::llm::{EmbeddingClient, EmbeddingMode};
use super::chunker::split_into_chunks;
use super::index::{IndexError, VectorIndex};

#[derive(Debug, Clone, Default)]
pub struct KnowledgeBase {
    chunks: Vec<String>,
    index: Option<VectorIndex>,
}

impl KnowledgeBase {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pairs chunks with their embeddings.
    ///
    /// With no vectors the index is left absent. A vector count that differs
    /// from the chunk count also leaves it absent, since positions would no
    /// longer line up with chunks.
    pub fn from_parts(chunks: Vec<String>, vectors: &[Vec<f32>]) -> Result<Self, IndexError> {
        if !vectors.is_empty() && vectors.len() != chunks.len() {
            tracing::warn!(
                "Got {} embeddings for {} FAQ chunks; index disabled",
                vectors.len(),
                chunks.len()
            );
            return Ok(Self {
                chunks,
                index: None,
            });
        }

        let index = VectorIndex::build(vectors)?;
        Ok(Self { chunks, index })
    }

    /// Chunks `text`, embeds the chunks as documents and indexes them.
    pub async fn build(text: &str, embeddings: &EmbeddingClient) -> Self {
        let chunks = split_into_chunks(text);
        if chunks.is_empty() {
            tracing::warn!("FAQ source is empty or could not be chunked. No grounding data loaded.");
            return Self::empty();
        }
        tracing::info!("Loaded {} FAQ chunks; generating embeddings", chunks.len());

        let vectors = match embeddings.embed(&chunks, EmbeddingMode::Document).await {
            Ok(result) => result.into_vectors(),
            Err(err) => {
                tracing::error!("Embedding FAQ chunks failed: {}", err);
                Vec::new()
            }
        };
        if vectors.is_empty() {
            tracing::warn!("Failed to generate embeddings for FAQ chunks; answering ungrounded");
        }

        match Self::from_parts(chunks.clone(), &vectors) {
            Ok(knowledge) => {
                if let Some(index) = knowledge.index() {
                    tracing::info!(
                        "Indexed {} FAQ vectors (dimension {})",
                        index.len(),
                        index.dimension()
                    );
                }
                knowledge
            }
            Err(err) => {
                tracing::error!("Failed to build FAQ index: {}", err);
                Self {
                    chunks,
                    index: None,
                }
            }
        }
    }

    /// Reads the FAQ file at `path` and builds from it. A missing or
    /// unreadable file yields an empty knowledge base.
    pub async fn load(path: &Path, embeddings: &EmbeddingClient) -> Self {
        tracing::info!("Loading FAQ data from {}", path.display());
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Self::build(&text, embeddings).await,
            Err(err) => {
                tracing::warn!(
                    "Could not read FAQ file {}: {}. Continuing without grounding data.",
                    path.display(),
                    err
                );
                Self::empty()
            }
        }
    }

    /// Pairs chunks with an index without checking that they line up.
    #[cfg(test)]
    pub(crate) fn with_index(chunks: Vec<String>, index: VectorIndex) -> Self {
        Self {
            chunks,
            index: Some(index),
        }
    }

    pub fn chunk(&self, position: usize) -> Option<&str> {
        self.chunks.get(position).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    pub fn is_searchable(&self) -> bool {
        !self.chunks.is_empty() && self.index.as_ref().is_some_and(|index| !index.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::llm::embedding::fakes::{FailingEmbedder, TableEmbedder};
    use crate::llm::EmbeddingError;
    use super::*;

    fn table_client() -> EmbeddingClient {
        EmbeddingClient::new(Arc::new(TableEmbedder::new(
            &[
                ("Reset password: go to settings.", vec![1.0, 0.0]),
                ("Contact support at help@example.com.", vec![0.0, 1.0]),
            ],
            vec![0.5, 0.5],
        )))
    }

    #[tokio::test]
    async fn build_indexes_every_chunk() {
        let knowledge = KnowledgeBase::build(
            "Reset password: go to settings.\n\nContact support at help@example.com.\n",
            &table_client(),
        )
        .await;

        assert_eq!(knowledge.len(), 2);
        let index = knowledge.index().expect("index present");
        assert_eq!(index.len(), knowledge.len());
        assert_eq!(index.dimension(), 2);
        assert!(knowledge.is_searchable());
    }

    #[tokio::test]
    async fn empty_source_has_no_index() {
        let knowledge = KnowledgeBase::build("\n  \n", &table_client()).await;
        assert!(knowledge.is_empty());
        assert!(knowledge.index().is_none());
        assert!(!knowledge.is_searchable());
    }

    #[tokio::test]
    async fn embedding_outage_keeps_chunks_without_index() {
        let client = EmbeddingClient::new(Arc::new(FailingEmbedder {
            make: || EmbeddingError::Transport("down".to_string()),
        }));
        let knowledge = KnowledgeBase::build("a\n\nb", &client).await;

        assert_eq!(knowledge.len(), 2);
        assert!(knowledge.index().is_none());
    }

    #[tokio::test]
    async fn missing_file_degrades_to_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let knowledge = KnowledgeBase::load(&dir.path().join("faq.txt"), &table_client()).await;
        assert!(knowledge.is_empty());
    }

    #[tokio::test]
    async fn load_reads_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("faq.txt");
        std::fs::write(&path, "Reset password: go to settings.\n\n\nContact support at help@example.com.")
            .expect("write faq");

        let knowledge = KnowledgeBase::load(&path, &table_client()).await;
        assert_eq!(knowledge.chunk(1), Some("Contact support at help@example.com."));
        assert_eq!(knowledge.chunk(2), None);
    }

    #[test]
    fn from_parts_enforces_dimension_and_alignment() {
        let chunks = vec!["a".to_string(), "b".to_string()];
        assert!(KnowledgeBase::from_parts(chunks.clone(), &[vec![1.0], vec![1.0, 2.0]]).is_err());

        let misaligned = KnowledgeBase::from_parts(chunks, &[vec![1.0]]).expect("degrades");
        assert!(misaligned.index().is_none());
        assert_eq!(misaligned.len(), 2);
    }
}
