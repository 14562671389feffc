//! Local dense-embedding similarity.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use skill_embeddings::{Embedding, EmbeddingModel, DEFAULT_BATCH_SIZE};

use super::{check_score_count, ProviderError, SimilarityProvider};

/// Cosine similarity over embeddings from a local model.
///
/// Embedding is CPU-bound, so it runs on tokio's blocking pool.
pub struct LocalEmbeddingProvider<E: EmbeddingModel + 'static> {
    embedder: Arc<E>,
    batch_size: usize,
}

impl<E: EmbeddingModel + 'static> LocalEmbeddingProvider<E> {
    pub fn new(embedder: Arc<E>) -> Self {
        Self::with_batch_size(embedder, DEFAULT_BATCH_SIZE)
    }

    pub fn with_batch_size(embedder: Arc<E>, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
        }
    }

    async fn embed_all(&self, phrases: Vec<String>) -> Result<Vec<Embedding>, ProviderError> {
        let embedder = Arc::clone(&self.embedder);
        let batch_size = self.batch_size;
        let expected = phrases.len();

        let vectors = tokio::task::spawn_blocking(move || embedder.embed_chunked(&phrases, batch_size))
            .await
            .map_err(|e| ProviderError::Task(e.to_string()))??;

        if vectors.len() != expected {
            return Err(ProviderError::LengthMismatch {
                expected,
                actual: vectors.len(),
            });
        }
        Ok(vectors)
    }
}

#[async_trait]
impl<E: EmbeddingModel + 'static> SimilarityProvider for LocalEmbeddingProvider<E> {
    fn name(&self) -> &str {
        "local"
    }

    async fn score(&self, query: &str, candidates: &[String]) -> Result<Vec<f32>, ProviderError> {
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let mut phrases = Vec::with_capacity(candidates.len() + 1);
        phrases.push(query.to_string());
        phrases.extend_from_slice(candidates);

        let vectors = self.embed_all(phrases).await?;
        let (query_vec, candidate_vecs) = vectors
            .split_first()
            .ok_or(ProviderError::LengthMismatch {
                expected: candidates.len() + 1,
                actual: 0,
            })?;

        let scores = candidate_vecs
            .iter()
            .map(|c| query_vec.cosine_similarity(c))
            .collect();
        debug!(candidates = candidates.len(), "Scored with local embeddings");
        check_score_count(candidates.len(), scores)
    }

    async fn embed_phrases(
        &self,
        phrases: &[String],
    ) -> Result<Option<Vec<Embedding>>, ProviderError> {
        debug!(count = phrases.len(), batch_size = self.batch_size, "Embedding phrases");
        self.embed_all(phrases.to_vec()).await.map(Some)
    }
}
