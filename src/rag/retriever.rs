//! Query-time FAQ lookup.
//!
//! The chat orchestrator drives the two halves separately
//! ([`Retriever::embed_query`], then [`Retriever::search`]) so each gets its
//! own stage; [`Retriever::retrieve_scored`] runs both.

use std::sync::Arc;

use crate::llm::{EmbeddingClient, EmbeddingError, EmbeddingMode};
use super::knowledge::KnowledgeBase;

pub const DEFAULT_TOP_K: usize = 3;

/// A retrieved FAQ chunk with its inner-product score.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub text: String,
    pub score: f32,
}

/// Embeds queries and looks them up in the shared knowledge base.
#[derive(Clone)]
pub struct Retriever {
    knowledge: Arc<KnowledgeBase>,
    embeddings: EmbeddingClient,
    top_k: usize,
}

impl Retriever {
    pub fn new(knowledge: Arc<KnowledgeBase>, embeddings: EmbeddingClient, top_k: usize) -> Self {
        Self {
            knowledge,
            embeddings,
            top_k: top_k.max(1),
        }
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Returns up to `k` chunks with scores, most relevant first.
    ///
    /// An empty result means "nothing to ground on"; only a fatal embedding
    /// error is returned as `Err`.
    pub async fn retrieve_scored(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, EmbeddingError> {
        match self.embed_query(query).await? {
            Some(query_vector) => Ok(self.search(&query_vector, k)),
            None => Ok(Vec::new()),
        }
    }

    /// Produces the query-mode embedding, or `None` when there is nothing to
    /// search or the provider produced no vector.
    pub async fn embed_query(&self, query: &str) -> Result<Option<Vec<f32>>, EmbeddingError> {
        if !self.knowledge.is_searchable() {
            tracing::debug!("FAQ index not initialized; skipping query embedding");
            return Ok(None);
        }

        let vector = self.embeddings.embed_one(query, EmbeddingMode::Query).await?;
        if vector.is_none() {
            tracing::warn!("No embedding produced for the query; answering without FAQ context");
        }
        Ok(vector)
    }

    /// Maps the `k` best index hits back to chunk text, dropping positions
    /// that fall outside the corpus.
    pub fn search(&self, query_vector: &[f32], k: usize) -> Vec<RetrievedChunk> {
        let Some(index) = self.knowledge.index() else {
            return Vec::new();
        };

        let results: Vec<RetrievedChunk> = index
            .search(query_vector, k)
            .into_iter()
            .filter_map(|hit| match self.knowledge.chunk(hit.position) {
                Some(text) => Some(RetrievedChunk {
                    text: text.to_string(),
                    score: hit.score,
                }),
                None => {
                    tracing::warn!("Dropping out-of-range FAQ position {}", hit.position);
                    None
                }
            })
            .collect();

        tracing::info!(
            "Found {} relevant FAQs with scores: {:?}",
            results.len(),
            results.iter().map(|chunk| chunk.score).collect::<Vec<_>>()
        );
        results
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use crate::llm::embedding::fakes::{FailingEmbedder, TableEmbedder};
    use crate::rag::VectorIndex;
    use super::*;

    async fn texts(retriever: &Retriever, query: &str) -> Result<Vec<String>, EmbeddingError> {
        let scored = retriever.retrieve_scored(query, retriever.top_k()).await?;
        Ok(scored.into_iter().map(|chunk| chunk.text).collect())
    }

    fn knowledge() -> Arc<KnowledgeBase> {
        Arc::new(
            KnowledgeBase::from_parts(
                vec![
                    "alpha".to_string(),
                    "beta".to_string(),
                    "gamma".to_string(),
                ],
                &[vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]],
            )
            .expect("knowledge builds"),
        )
    }

    #[tokio::test]
    async fn returns_chunks_by_descending_score() {
        let embedder = TableEmbedder::new(&[("q", vec![0.2, 0.7, 0.1])], vec![0.0; 3]);
        let retriever = Retriever::new(knowledge(), EmbeddingClient::new(Arc::new(embedder)), 2);

        assert_eq!(
            texts(&retriever, "q").await.expect("ok"),
            vec!["beta".to_string(), "alpha".to_string()]
        );
        let scored = retriever.retrieve_scored("q", 10).await.expect("ok");
        assert_eq!(scored.len(), 3);
        assert_eq!(scored[2].text, "gamma");
    }

    #[tokio::test]
    async fn missing_query_embedding_yields_empty_result() {
        let retriever = Retriever::new(
            knowledge(),
            EmbeddingClient::new(Arc::new(FailingEmbedder {
                make: || EmbeddingError::MissingCredentials,
            })),
            DEFAULT_TOP_K,
        );
        assert!(texts(&retriever, "anything").await.expect("degrades").is_empty());
    }

    #[tokio::test]
    async fn query_dimension_mismatch_yields_empty_result() {
        let embedder = TableEmbedder::new(&[], vec![1.0, 0.0]);
        let retriever = Retriever::new(knowledge(), EmbeddingClient::new(Arc::new(embedder)), 3);
        assert!(texts(&retriever, "q").await.expect("ok").is_empty());
    }

    #[tokio::test]
    async fn absent_index_skips_the_embedding_call() {
        let embedder = Arc::new(TableEmbedder::new(&[], vec![1.0]));
        let retriever = Retriever::new(
            Arc::new(KnowledgeBase::empty()),
            EmbeddingClient::new(embedder.clone()),
            3,
        );

        assert!(texts(&retriever, "q").await.expect("ok").is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fatal_embedding_errors_surface() {
        let retriever = Retriever::new(
            knowledge(),
            EmbeddingClient::new(Arc::new(FailingEmbedder {
                make: || EmbeddingError::Fatal("invalid header value".to_string()),
            })),
            3,
        );
        assert!(texts(&retriever, "q").await.is_err());
    }

    #[test]
    fn positions_past_the_corpus_are_dropped() {
        let index = VectorIndex::build(&[vec![0.1, 0.0], vec![0.2, 0.0], vec![0.9, 0.0]])
            .expect("build")
            .expect("index");
        let knowledge = KnowledgeBase::with_index(
            vec!["first".to_string(), "second".to_string()],
            index,
        );
        let retriever = Retriever::new(
            Arc::new(knowledge),
            EmbeddingClient::new(Arc::new(TableEmbedder::new(&[], vec![1.0, 0.0]))),
            3,
        );

        let results = retriever.search(&[1.0, 0.0], 3);
        assert_eq!(
            results.iter().map(|chunk| chunk.text.as_str()).collect::<Vec<_>>(),
            vec!["second", "first"]
        );
    }
}
